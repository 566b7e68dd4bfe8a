pub mod fake_proc;
