pub mod method_name;
