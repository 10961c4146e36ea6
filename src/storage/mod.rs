//! Storage layer: the Spartan engine. Heap files, indexes, and the
//! table handler that couples them under a per-table share.

pub mod heap;
pub mod index;
pub mod table;
