mod controller;
mod error;
mod interval;
mod outcome;
mod request;
mod series;
mod state;

pub mod indicators;
pub mod providers;
pub mod render;
pub mod transform;

pub use controller::{Event, FetchController, Phase, Trigger, run_cycle};
pub use error::{ProviderError, RenderError};
pub use interval::Interval;
pub use outcome::{FetchFailure, FetchOutcome, FetchResult, FetchSuccess};
pub use providers::DataProvider;
pub use request::{
    FetchRequest, Field, FormInput, ProviderQuery, QuickRange, ValidationError, parse_date,
    validate,
};
pub use series::PriceSeries;
pub use state::{MovingAverage, ViewState};
