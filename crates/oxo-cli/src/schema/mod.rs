pub mod q_model;
