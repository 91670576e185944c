pub mod attach;
pub mod attributes;
pub mod convert;
pub mod error;
pub mod graph;
pub mod instances;
pub mod state;
pub mod terraform;
pub mod validate;

pub use convert::convert_state;
pub use error::ConvertError;
pub use graph::DependencyGraph;
pub use state::{
    Agent, AgentAuth, AgentMetadata, App, DisplayApps, Healthcheck, Parameter, ParameterOption,
    ParameterType, ParameterValidation, Resource, ResourceMetadata, Script, SharingLevel, State,
};
pub use terraform::{flatten, Catalog, Module, Plan, RawResource, ResourceMode, StateDump};
