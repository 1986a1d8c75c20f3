pub mod travelling_salesman;
