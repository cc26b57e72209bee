//! Request execution
//!
//! Planning turns one logical call into concrete HTTP descriptors, the
//! executor sends them, and dispatch collects one outcome per leg.

pub mod dispatch;
pub mod executor;
pub mod headers;
pub mod planner;

pub use dispatch::{DispatchPolicy, FanOut, LegOutcome, dispatch};
pub use executor::{RawResponse, ResponseBody, TransportExecutor};
pub use planner::{LegInfo, PlanRequest, RequestBody, RequestDescriptor, RequestPlanner};
