//! volc-relay-cli — 请求转换演练与路由表查看的命令行工具
//!
//! Usage:
//!   volc-relay-cli translate <capability> <request.json> [OPTIONS]   Dry-run a conversion
//!   volc-relay-cli route [--base-url <url>]                          Print the endpoint table

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use tracing_subscriber::EnvFilter;
use volcengine_relay::auth::redact;
use volcengine_relay::multipart::{FormFile, InboundForm, PartBody};
use volcengine_relay::router::{resolve_url, RouteQuery};
use volcengine_relay::types::RelayFormat;
use volcengine_relay::{
    Adaptor, AdaptorConfig, AudioRequest, CanonicalRequest, Capability, Error, ImageEditRequest,
    ImageRequest, OpenAiCompatibleRelay, PreparedRequest, RelayContext, StreamingSession,
    StreamingTransport, TransportKind, VideoTaskRequest,
};

/// Conversions never open a session; dispatch is not part of a dry run.
struct NoStreaming;

#[async_trait]
impl StreamingTransport for NoStreaming {
    async fn open(
        &self,
        _url: &str,
        _headers: &HeaderMap,
    ) -> volcengine_relay::Result<Box<dyn StreamingSession>> {
        Err(Error::unsupported("streaming sessions are not available in dry runs"))
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    match args[1].as_str() {
        "translate" => cmd_translate(&args[2..]).await,
        "route" => cmd_route(&args[2..]),
        "version" | "--version" | "-V" => cmd_version(),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!(
        r#"volc-relay-cli — 火山引擎渠道适配器命令行工具

USAGE:
    volc-relay-cli <COMMAND> [OPTIONS]

COMMANDS:
    translate <capability> <request.json>   Print the outbound request without sending it
    route                                   Print the endpoint table
    version                                 Show version information
    help                                    Show this help message

TRANSLATE OPTIONS:
    --model <name>          Model name (defaults to the body's "model")
    --credential <key>      Bearer key, or appid|token for audio_speech
    --base-url <url>        Channel base URL
    --claude                Treat a chat body as an Anthropic Messages request
    --file <key>=<path>     Attach a file to an image_edit form (repeatable)

CAPABILITIES:
    chat_completions, embeddings, rerank, image_generation, image_edit,
    audio_speech, video_task

ENVIRONMENT:
    VOLC_BASE_URL           Channel base URL
    VOLC_MAX_FORM_BYTES     Multipart form size limit
    RUST_LOG                Log filter, e.g. volcengine_relay=debug"#
    );
}

fn cmd_version() {
    println!(
        "volc-relay-cli {} (volcengine-relay {})",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_VERSION"),
    );
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn flag_values<'a>(args: &'a [String], name: &str) -> Vec<&'a str> {
    args.iter()
        .enumerate()
        .filter(|(_, a)| *a == name)
        .filter_map(|(i, _)| args.get(i + 1).map(String::as_str))
        .collect()
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

fn image_edit_request(body: &[u8], files: &[&str]) -> volcengine_relay::Result<ImageEditRequest> {
    let image = ImageRequest::from_json_body(body)?;
    let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(body)?;
    let mut form = InboundForm::new();
    for (key, value) in &raw {
        match value {
            serde_json::Value::String(s) => form.add_field(key.clone(), s.clone()),
            serde_json::Value::Null => {}
            other => form.add_field(key.clone(), other.to_string()),
        }
    }
    for spec in files {
        let (key, path) = spec
            .split_once('=')
            .ok_or_else(|| Error::validation(format!("expected <key>=<path>, got {spec}")))?;
        let filename = std::path::Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(path);
        form.add_file(key, FormFile::from_path(filename, path));
    }
    Ok(ImageEditRequest { image, form })
}

fn canonical_request(
    capability: Capability,
    body: &[u8],
    claude: bool,
    files: &[&str],
) -> volcengine_relay::Result<CanonicalRequest> {
    Ok(match capability {
        Capability::ChatCompletions if claude => {
            CanonicalRequest::ClaudeMessages(serde_json::from_slice(body)?)
        }
        Capability::ChatCompletions => CanonicalRequest::Chat(serde_json::from_slice(body)?),
        Capability::Embeddings => CanonicalRequest::Embedding(serde_json::from_slice(body)?),
        Capability::Rerank => CanonicalRequest::Rerank(serde_json::from_slice(body)?),
        Capability::ImageGeneration => {
            CanonicalRequest::ImageGeneration(ImageRequest::from_json_body(body)?)
        }
        Capability::ImageEdit => CanonicalRequest::ImageEdit(image_edit_request(body, files)?),
        Capability::AudioSpeech => CanonicalRequest::Audio(AudioRequest::from_json_body(body)?),
        Capability::VideoTask => {
            CanonicalRequest::Video(serde_json::from_slice::<VideoTaskRequest>(body)?)
        }
        other => {
            return Err(Error::unsupported(format!(
                "no dry run for capability {other}"
            )))
        }
    })
}

fn print_headers(headers: &HeaderMap) {
    for (name, value) in headers {
        let shown = if *name == AUTHORIZATION {
            redact(value.to_str().unwrap_or(""))
        } else {
            value.to_str().unwrap_or("<binary>").to_string()
        };
        println!("  {name}: {shown}");
    }
}

async fn cmd_translate(args: &[String]) {
    let (Some(cap_name), Some(path)) = (args.first(), args.get(1)) else {
        fail("translate needs <capability> <request.json>");
    };
    let capability = Capability::from_str(cap_name)
        .unwrap_or_else(|| fail(format!("unknown capability: {cap_name}")));
    let body = std::fs::read(path).unwrap_or_else(|e| fail(format!("cannot read {path}: {e}")));
    let opts = &args[2..];

    let model = flag_value(opts, "--model").map(str::to_string).unwrap_or_else(|| {
        serde_json::from_slice::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v["model"].as_str().map(str::to_string))
            .unwrap_or_default()
    });
    let credential = flag_value(opts, "--credential").unwrap_or(
        if capability == Capability::AudioSpeech {
            "dry-run-app|dry-run-token"
        } else {
            "sk-dry-run"
        },
    );
    let claude = opts.iter().any(|a| a == "--claude");

    let mut config = AdaptorConfig::from_env();
    if let Some(base) = flag_value(opts, "--base-url") {
        config = config.with_base_url(base);
    }
    let rest = match OpenAiCompatibleRelay::from_config(&config) {
        Ok(r) => Arc::new(r),
        Err(e) => fail(e),
    };
    let adaptor = Adaptor::new(config, rest, Arc::new(NoStreaming)).unwrap_or_else(|e| fail(e));

    let request = canonical_request(capability, &body, claude, &flag_values(opts, "--file"))
        .unwrap_or_else(|e| fail(e));
    let mut ctx = RelayContext::new(capability, model, credential);
    if claude {
        ctx = ctx.with_relay_format(RelayFormat::Claude);
    }

    let prepared = adaptor
        .convert(&mut ctx, request)
        .await
        .unwrap_or_else(|e| fail(e));
    let url = adaptor.request_url(&ctx).unwrap_or_else(|e| fail(e));
    let headers = adaptor.request_headers(&ctx).unwrap_or_else(|e| fail(e));

    println!("POST {url}");
    println!("transport: {:?}, stream: {}", ctx.transport, ctx.is_stream);
    println!("headers:");
    print_headers(&headers);
    println!("body:");
    match prepared {
        PreparedRequest::Json(v) => {
            println!("{}", serde_json::to_string_pretty(&v).unwrap_or_default())
        }
        PreparedRequest::Speech(req) => {
            println!("{}", serde_json::to_string_pretty(&req).unwrap_or_default())
        }
        PreparedRequest::Multipart(env) => {
            for part in env.parts() {
                match &part.body {
                    PartBody::Text(v) => println!("  {} = {v}", part.name),
                    PartBody::File {
                        filename,
                        content_type,
                        data,
                    } => println!(
                        "  {} = <{filename}, {content_type}, {} bytes>",
                        part.name,
                        data.len()
                    ),
                }
            }
        }
    }
}

fn cmd_route(args: &[String]) {
    let base_url = flag_value(args, "--base-url");
    println!("{:<22} {:<10} URL", "CAPABILITY", "TRANSPORT");
    for capability in Capability::ALL {
        let transports: &[TransportKind] = if capability == Capability::AudioSpeech {
            &[TransportKind::Streaming, TransportKind::Rest]
        } else {
            &[TransportKind::Rest]
        };
        for transport in transports {
            let query = RouteQuery {
                capability,
                upstream_model: "",
                relay_format: RelayFormat::OpenAi,
                transport: *transport,
                base_url,
            };
            let url = resolve_url(&query).unwrap_or_else(|e| format!("<{}>", e.kind().as_str()));
            println!("{:<22} {:<10} {url}", capability.as_str(), format!("{transport:?}"));
        }
    }
}
