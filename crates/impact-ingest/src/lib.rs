//! Mission Impact file boundary.

pub mod csv_table;
pub mod discovery;
pub mod mapping_store;
pub mod schema_file;

pub use csv_table::{read_dataset, read_sheet, unnamed_header, write_sheet};
pub use discovery::{dataset_name, expand_dataset_paths, list_csv_files};
pub use mapping_store::{load_field_mapping_sheets, mapping_path, write_field_mappings};
pub use schema_file::{load_table_schema, parse_table_schema};
