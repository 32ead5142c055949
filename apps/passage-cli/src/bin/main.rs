use std::env;
use std::path::PathBuf;

use passage_core::config::{expand_path, Config};
use passage_core::text::{ChunkingConfig, PlainTextExtractor};
use passage_core::traits::{Embedder, TextExtractor};
use passage_embed::{resolve_model_dir, LazyEmbedder};
use passage_engine::{QueryMode, RetrievalEngine};
use passage_llm::{ChatClient, Synthesizer, OPENROUTER_BASE_URL};
use passage_vector::VectorIndex;

const DEFAULT_TOP_K: usize = 3;

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {} <ingest|query|ask|models|clear|status> [args...]", prog);
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

async fn build_engine(config: &Config) -> anyhow::Result<RetrievalEngine> {
    let index_dir = expand_path(config.get_or::<String>("index.dir", "./data/lancedb".to_string()));
    let table: String = config.get_or("index.table", "documents".to_string());
    let model_dir = resolve_model_dir(config.get::<String>("embed.model_dir").ok().as_deref());
    let chunking = ChunkingConfig {
        size: config.get_or("chunk.size", 500),
        overlap: config.get_or("chunk.overlap", 80),
    };

    println!("🚀 Initializing services...");
    let embedder = LazyEmbedder::new(model_dir);
    embedder.load()?;
    let index = VectorIndex::open(&index_dir, &table, embedder.embedder_id(), embedder.dim()).await?;

    let base_url: String = config.get_or("llm.base_url", OPENROUTER_BASE_URL.to_string());
    let timeout_secs: u64 = config.get_or("llm.timeout_secs", 60);
    let synthesizer = Synthesizer::new(ChatClient::new(base_url, timeout_secs)?);

    println!("✅ Services ready");
    Ok(RetrievalEngine::new(chunking, Box::new(embedder), index, synthesizer))
}

fn llm_api_key() -> anyhow::Result<String> {
    env::var("APP_LLM_API_KEY").map_err(|_| anyhow::anyhow!("set APP_LLM_API_KEY to talk to the chat provider"))
}

fn llm_model(config: &Config) -> anyhow::Result<String> {
    config
        .get("llm.model")
        .map_err(|_| anyhow::anyhow!("set llm.model in config.toml (see `passage models` for ids)"))
}

fn parse_top_k(args: &[String]) -> usize {
    args.get(1).and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_TOP_K)
}

fn print_hits(hits: &[passage_core::types::SearchHit]) {
    for (i, hit) in hits.iter().enumerate() {
        let preview: String = hit.text.chars().take(120).collect();
        println!("  {}. distance={:.4} id={} | {}", i + 1, hit.distance, hit.id, preview);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "ingest" => {
            let path = args.get(0).map(PathBuf::from).unwrap_or_else(|| {
                eprintln!("Usage: passage ingest <file.txt>");
                std::process::exit(1)
            });
            let extractor = PlainTextExtractor;
            // Extraction failure is an empty document, not a crash
            let text = extractor.extract(&path).unwrap_or_default();
            let engine = build_engine(&config).await?;
            let count = engine.ingest(&text).await?;
            println!("✅ Ingest complete ({} chunks from {})", count, path.display());
        }
        "query" => {
            let query = args.get(0).cloned().unwrap_or_else(|| {
                eprintln!("Usage: passage query \"<query>\" [top_k]");
                std::process::exit(1)
            });
            let top_k = parse_top_k(&args);
            let engine = build_engine(&config).await?;
            let hits = engine.retrieve(&query, top_k).await?;
            println!("🔍 {} results:", hits.len());
            print_hits(&hits);
        }
        "ask" => {
            let query = args.get(0).cloned().unwrap_or_else(|| {
                eprintln!("Usage: passage ask \"<question>\" [top_k]");
                std::process::exit(1)
            });
            let top_k = parse_top_k(&args);
            let model = llm_model(&config)?;
            let api_key = llm_api_key()?;
            let engine = build_engine(&config).await?;
            let mode = QueryMode::GroundedSynthesis { model, api_key };
            let response = engine.ask(&query, top_k, &mode).await?;
            if let Some(answer) = &response.answer {
                println!("💬 {}\n", answer);
            }
            println!("Sources:");
            print_hits(&response.chunks);
        }
        "models" => {
            let api_key = llm_api_key()?;
            let base_url: String = config.get_or("llm.base_url", OPENROUTER_BASE_URL.to_string());
            let timeout_secs: u64 = config.get_or("llm.timeout_secs", 60);
            let client = ChatClient::new(base_url, timeout_secs)?;
            let models = client.list_models(&api_key).await?;
            for id in models {
                println!("{}", id);
            }
        }
        "clear" => {
            let engine = build_engine(&config).await?;
            engine.clear().await?;
            println!("🗑️  Index cleared");
        }
        "status" => {
            let engine = build_engine(&config).await?;
            println!("📊 {} entries indexed", engine.count().await?);
        }
        _ => {
            eprintln!("Unknown command: {}", cmd);
            std::process::exit(1);
        }
    }
    Ok(())
}
