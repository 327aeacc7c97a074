// Tunable navigation parameters
//
// Distances are in world units (the units of the mesh file). Defaults match
// a standing player hull: 18 unit steps, 72 unit crouch jumps.

use navgraph_shared::config::Config;

/// Which vertical obstacles the agent may climb when crossing area borders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    StepOnly,
    StepOrJump,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavSettings {
    /// Highest ledge walked up without jumping
    pub step_height: f32,
    /// Highest ledge reachable with a single jump
    pub jump_height: f32,
    /// Deepest drop accepted before a route is rejected
    pub max_fall_distance: f32,
    pub hull_half_width: f32,
    pub hull_height: f32,

    /// Distance doors keep from wall corners
    pub door_clearance: f32,
    /// Doors narrower than this collapse to their middle point
    pub min_door_width: f32,
    /// How close a corner must be to a neighbor's boundary to count as shared
    pub corner_tolerance: f32,

    pub hill_threshold: f32,
    pub max_slope_degrees: f32,
    pub goal_tolerance_xy: f32,
    pub goal_tolerance_z: f32,
    pub trace_step_length: f32,
    pub ground_trace_step: f32,
    pub max_trace_iterations: usize,
    pub max_graph_steps: usize,
    /// Cross-axis slack when matching a boundary crossing to a neighbor
    pub cross_axis_tolerance: f32,

    pub max_search_iterations: usize,
    pub containment_candidates: usize,
    pub simplify_paths: bool,
    /// A shortcut must be shorter than this fraction of the walked distance
    pub simplify_ratio: f32,
    pub synthesize_doors: bool,
    pub allow_jump: bool,
}

impl Default for NavSettings {
    fn default() -> Self {
        NavSettings {
            step_height: 18.0,
            jump_height: 72.0,
            max_fall_distance: 250.0,
            hull_half_width: 24.0,
            hull_height: 82.0,
            door_clearance: 24.0,
            min_door_width: 24.0,
            corner_tolerance: 2.0,
            hill_threshold: 18.0,
            max_slope_degrees: 45.57,
            goal_tolerance_xy: 16.0,
            goal_tolerance_z: 18.0,
            trace_step_length: 48.0,
            ground_trace_step: 18.0,
            max_trace_iterations: 256,
            max_graph_steps: 128,
            cross_axis_tolerance: 4.0,
            max_search_iterations: 200_000,
            containment_candidates: 8,
            simplify_paths: true,
            simplify_ratio: 0.8,
            synthesize_doors: true,
            allow_jump: true,
        }
    }
}

impl NavSettings {
    /// Read settings from the `[Navigation]` section, falling back to defaults
    pub fn from_config(config: &Config) -> Self {
        let d = NavSettings::default();
        let f = |key: &str, default: f32| {
            config.get_float_default(&format!("Navigation.{}", key), default)
        };
        let n = |key: &str, default: usize| {
            config
                .get_int_default(&format!("Navigation.{}", key), default as i32)
                .max(1) as usize
        };
        let b = |key: &str, default: bool| {
            config.get_bool_default(&format!("Navigation.{}", key), default)
        };

        NavSettings {
            step_height: f("StepHeight", d.step_height),
            jump_height: f("JumpHeight", d.jump_height),
            max_fall_distance: f("MaxFallDistance", d.max_fall_distance),
            hull_half_width: f("HullHalfWidth", d.hull_half_width),
            hull_height: f("HullHeight", d.hull_height),
            door_clearance: f("DoorClearance", d.door_clearance),
            min_door_width: f("MinDoorWidth", d.min_door_width),
            corner_tolerance: f("CornerTolerance", d.corner_tolerance),
            hill_threshold: f("HillThreshold", d.hill_threshold),
            max_slope_degrees: f("MaxSlopeDegrees", d.max_slope_degrees),
            goal_tolerance_xy: f("GoalToleranceXY", d.goal_tolerance_xy),
            goal_tolerance_z: f("GoalToleranceZ", d.goal_tolerance_z),
            trace_step_length: f("TraceStepLength", d.trace_step_length),
            ground_trace_step: f("GroundTraceStep", d.ground_trace_step),
            max_trace_iterations: n("MaxTraceIterations", d.max_trace_iterations),
            max_graph_steps: n("MaxGraphSteps", d.max_graph_steps),
            cross_axis_tolerance: f("CrossAxisTolerance", d.cross_axis_tolerance),
            max_search_iterations: n("MaxSearchIterations", d.max_search_iterations),
            containment_candidates: n("ContainmentCandidates", d.containment_candidates),
            simplify_paths: b("SimplifyPaths", d.simplify_paths),
            simplify_ratio: f("SimplifyRatio", d.simplify_ratio),
            synthesize_doors: b("SynthesizeDoors", d.synthesize_doors),
            allow_jump: b("AllowJump", d.allow_jump),
        }
    }

    pub fn step_policy(&self) -> StepPolicy {
        if self.allow_jump {
            StepPolicy::StepOrJump
        } else {
            StepPolicy::StepOnly
        }
    }

    /// Tallest climb permitted under `policy`
    pub fn max_climb(&self, policy: StepPolicy) -> f32 {
        match policy {
            StepPolicy::StepOnly => self.step_height,
            StepPolicy::StepOrJump => self.jump_height,
        }
    }

    /// Minimum ground normal z for a walkable surface
    pub fn min_walkable_normal_z(&self) -> f32 {
        self.max_slope_degrees.to_radians().cos()
    }
}
