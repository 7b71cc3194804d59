//! Live display of a monitor's state.
//!
//! The dashboard only reads: it polls on its own timer and never feeds back into recording,
//! except for the explicit clear action. Closing it leaves the monitor untouched.

pub mod driver;
pub mod view;

pub use driver::{DashboardCommand, DashboardControl, DashboardDriver, DriverReport, StopReason, Surface, TerminalSurface};
pub use view::{render_lines, Dashboard, DashboardFrame, DashboardState};
