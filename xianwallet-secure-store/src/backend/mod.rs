//! Encryption backends behind the store's format tags.
//!
//! Each backend turns the plaintext wallet payload into the bytes stored
//! after its [`FormatTag`](crate::FormatTag) and back. Selection and
//! dispatch live in [`store`](crate::store).

pub(crate) mod native;
pub(crate) mod password;
pub(crate) mod vault;
