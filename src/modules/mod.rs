pub mod sheet2xsp;
