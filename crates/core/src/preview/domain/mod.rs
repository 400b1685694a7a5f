pub mod preview_sink;
