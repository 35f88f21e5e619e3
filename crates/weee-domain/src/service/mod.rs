//! Decision services: mapper, aggregator, assembler

pub mod aggregator;
pub mod assembler;
pub mod mapper;
