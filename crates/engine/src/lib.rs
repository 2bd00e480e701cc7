pub mod cell;
pub mod offset;
pub mod sheet;
pub mod workbook;
