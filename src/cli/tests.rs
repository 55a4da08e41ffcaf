#[cfg(test)]
mod tests {
    use crate::cli::Args;
    use crate::config::{LLMProvider, Process};
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn test_args_default_values() {
        let args = Args::try_parse_from(["deepscribe-rs"]).unwrap();

        assert!(args.topic.is_none());
        assert!(!args.serve);
        assert!(args.config.is_none());
        assert!(!args.keep_knowledge);
        assert!(!args.sequential);
        assert!(args.ingest.is_none());
        assert!(!args.check);
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_topic_and_flags() {
        let args = Args::try_parse_from([
            "deepscribe-rs",
            "-t",
            "Quantum Computing",
            "--keep-knowledge",
            "--sequential",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.topic, Some("Quantum Computing".to_string()));
        assert!(args.keep_knowledge);
        assert!(args.sequential);
        assert!(args.verbose);
    }

    #[test]
    fn test_args_llm_options() {
        let args = Args::try_parse_from([
            "deepscribe-rs",
            "--llm-provider",
            "openai",
            "--llm-api-key",
            "test-key",
            "--llm-api-base-url",
            "https://api.openai.com/v1",
            "--model",
            "gpt-4o",
            "--max-tokens",
            "2048",
            "--temperature",
            "0.7",
        ])
        .unwrap();

        assert_eq!(args.llm_provider, Some("openai".to_string()));
        assert_eq!(args.llm_api_key, Some("test-key".to_string()));
        assert_eq!(
            args.llm_api_base_url,
            Some("https://api.openai.com/v1".to_string())
        );
        assert_eq!(args.model, Some("gpt-4o".to_string()));
        assert_eq!(args.max_tokens, Some(2048));
        assert_eq!(args.temperature, Some(0.7));
    }

    #[test]
    fn test_args_serve_mode() {
        let args = Args::try_parse_from([
            "deepscribe-rs",
            "--serve",
            "--bind",
            "0.0.0.0:9000",
        ])
        .unwrap();

        assert!(args.serve);
        assert_eq!(args.bind, Some("0.0.0.0:9000".to_string()));
    }

    #[test]
    fn test_into_config_basic() {
        let args = Args::try_parse_from([
            "deepscribe-rs",
            "-o",
            "/test/output",
            "--store-dir",
            "/test/knowledge",
        ])
        .unwrap();

        let config = args.into_config();

        assert_eq!(config.output_path, PathBuf::from("/test/output"));
        assert_eq!(config.knowledge.store_dir, PathBuf::from("/test/knowledge"));
        assert!(config.knowledge.clear_before_run);
        assert_eq!(config.process, Process::Hierarchical);
    }

    #[test]
    fn test_into_config_with_overrides() {
        let args = Args::try_parse_from([
            "deepscribe-rs",
            "--llm-provider",
            "ollama",
            "--model",
            "llama3.1",
            "--keep-knowledge",
            "--sequential",
            "--verbose",
        ])
        .unwrap();

        let config = args.into_config();

        assert_eq!(config.llm.provider, LLMProvider::Ollama);
        assert_eq!(config.llm.model, "llama3.1");
        assert!(!config.knowledge.clear_before_run);
        assert_eq!(config.process, Process::Sequential);
        assert!(config.verbose);
    }

    #[test]
    fn test_into_config_invalid_provider_keeps_default() {
        let args = Args::try_parse_from([
            "deepscribe-rs",
            "--llm-provider",
            "invalid",
        ])
        .unwrap();

        let config = args.into_config();
        assert_eq!(config.llm.provider, LLMProvider::default());
    }

    #[test]
    fn test_into_config_explicit_api_key_wins() {
        let args = Args::try_parse_from([
            "deepscribe-rs",
            "--llm-provider",
            "openai",
            "--llm-api-key",
            "explicit-key",
        ])
        .unwrap();

        let config = args.into_config();
        assert_eq!(config.llm.provider, LLMProvider::OpenAI);
        assert_eq!(config.llm.api_key, "explicit-key");
    }

    #[test]
    fn test_args_ingest_and_check() {
        let args = Args::try_parse_from([
            "deepscribe-rs",
            "--ingest",
            "/docs/input.md",
            "--check",
        ])
        .unwrap();

        assert_eq!(args.ingest, Some(PathBuf::from("/docs/input.md")));
        assert!(args.check);
    }
}
