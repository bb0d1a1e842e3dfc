pub mod debounce;
pub mod job;
pub mod usecase;
