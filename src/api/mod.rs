pub mod graph_dto;
pub mod run_config_dto;
