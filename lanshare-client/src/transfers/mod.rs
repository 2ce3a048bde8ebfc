//! Saving downloads locally
//!
//! Downloads never overwrite anything: the destination name gets `(1)`
//! appended until it is free, bytes are staged in a `.part` file, and the
//! staging file is renamed only once every announced byte has arrived.

mod naming;
mod receive;
mod receive_dir;

pub use naming::{is_plain_file_name, part_path, unique_destination};
pub use receive::{Download, discard};
pub use receive_dir::prepare_receive_dir;
