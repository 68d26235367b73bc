pub mod local_db;
pub mod records;

pub use local_db::LocalDb;
pub use records::ComicRecord;
