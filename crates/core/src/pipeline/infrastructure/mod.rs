pub mod enrollment_worker;
