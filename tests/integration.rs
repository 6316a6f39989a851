// Integration tests module

mod integration {
    mod input_test;
    mod proc_parsing_test;
    mod table_test;
}
