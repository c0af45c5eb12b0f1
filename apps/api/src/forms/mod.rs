// Form definition model, builder, renderer and runtime.
// Pure modules (defaults, builder, render, validation) hold no I/O; the
// runtime reaches the outside world only through a `SubmitSink`.

pub mod builder;
pub mod defaults;
pub mod handlers;
pub mod models;
pub mod remote;
pub mod render;
pub mod runtime;
pub mod store;
pub mod validation;
