pub mod codec;

pub use codec::{
    MAGIC, SCORE_MAX, SEPARATOR, SaveData, SaveError, decode, encode, load_from_path,
    restore, save_to_path,
};
