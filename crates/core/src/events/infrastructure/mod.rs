pub mod jsonl_event_sink;
