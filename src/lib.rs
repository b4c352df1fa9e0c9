use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

pub mod common;
pub mod driver;
pub mod emitter;
pub mod encoder;
pub mod tables;
