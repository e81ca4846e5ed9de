//! 能力选择循环：Planner（调用解析）、轨迹与结果重建、主循环

pub mod loop_;
pub mod planner;
pub mod trace;

pub use loop_::{
    describe_capabilities, render_system_prompt, task_description, CapabilitySelectionLoop,
};
pub use planner::{parse_llm_output, CapabilityCall, Planner, PlannerOutput};
pub use trace::{reconstruct_outcome, TraceEntry};
