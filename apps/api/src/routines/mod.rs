// Routine logging: request shaping, solver score, and the two HTTP handlers.
// Handlers hold no state of their own; everything persistent goes through the injected store.

pub mod handlers;
pub mod scoring;
pub mod validation;
