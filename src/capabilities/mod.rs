//! 能力层：供能力选择循环调用的封闭能力集、调用格式 schema 与执行器

pub mod executor;
pub mod registry;
pub mod schema;

pub use executor::{answers_from_arg, CapabilityExecutor, CapabilityOutput};
pub use registry::{
    exposed, requirement, Capability, CapabilitySpec, InvocationFacts, Requirement,
    CAPABILITY_TABLE,
};
pub use schema::capability_call_schema_json;
