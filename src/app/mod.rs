//! Native plot window.
//!
//! | Sub-module | Responsibility |
//! | ---------- | -------------- |
//! | [`viewer`] | [`SiriusViewer`]: tabs, plot rendering, "Save CSV" |
//! | [`run`]    | [`run_viewer()`] entry point |

mod run;
mod viewer;

pub use run::run_viewer;
pub use viewer::SiriusViewer;
