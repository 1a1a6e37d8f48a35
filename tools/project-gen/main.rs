use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};
use std::fs;

/// A CLI tool to generate random, valid bot projects for stress-testing the compiler
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_project.json")]
    output: String,

    /// Number of sheets
    #[arg(long, default_value_t = 1)]
    sheets: usize,

    /// The minimum number of nodes per sheet, besides the entry node
    #[arg(long, default_value_t = 2)]
    min: usize,

    /// The maximum number of nodes per sheet, besides the entry node
    #[arg(long, default_value_t = 12)]
    max: usize,

    /// Seed for a reproducible project
    #[arg(long)]
    seed: Option<u64>,
}

const VARIABLES: [&str; 5] = ["name", "age", "city", "email", "phone"];
const MEDIA_TYPES: [&str; 4] = ["photo", "video", "audio", "document"];
const WORDS: [&str; 10] = [
    "Welcome", "Choose", "an", "option", "below", "thanks", "for", "visiting", "our", "shop",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.min > cli.max {
        eprintln!(
            "Error: --min ({}) cannot be greater than --max ({})",
            cli.min, cli.max
        );
        std::process::exit(1);
    }
    if cli.sheets == 0 {
        eprintln!("Error: --sheets must be at least 1");
        std::process::exit(1);
    }

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    println!(
        "Generating a project with {} sheet(s), {} to {} nodes each...",
        cli.sheets, cli.min, cli.max
    );

    let mut commands = 0usize;
    let mut sheets = Vec::with_capacity(cli.sheets);
    let mut entries = Vec::with_capacity(cli.sheets);
    for index in 0..cli.sheets {
        let count = rng.random_range(cli.min..=cli.max);
        let (sheet, entry) = generate_sheet(&mut rng, index, count, &mut commands);
        println!("-> Generated sheet '{}' with {} node(s).", entry.0, count + 1);
        sheets.push(sheet);
        entries.push(entry);
    }

    // Chain the sheets together through their entry nodes.
    let inter_sheet: Vec<Value> = entries
        .windows(2)
        .map(|pair| {
            json!({
                "source": pair[0].1,
                "target": pair[1].1,
                "isInterSheet": true,
                "sourceSheetId": pair[0].0,
                "targetSheetId": pair[1].0,
            })
        })
        .collect();

    let project = json!({
        "name": "Generated bot",
        "sheets": sheets,
        "interSheetConnections": inter_sheet,
        "activeSheetId": entries[0].0,
    });

    let json_output = serde_json::to_string_pretty(&project)?;
    fs::write(&cli.output, json_output)?;

    println!(
        "Successfully generated and saved the project to '{}'",
        cli.output
    );

    Ok(())
}

/// Generates one sheet. Returns the sheet and its `(sheet id, entry node id)`.
fn generate_sheet(
    rng: &mut StdRng,
    index: usize,
    count: usize,
    commands: &mut usize,
) -> (Value, (String, String)) {
    let sheet_id = format!("sheet_{}", index);
    let ids: Vec<String> = (0..=count)
        .map(|n| format!("s{}_n{}", index, n))
        .collect();

    let mut nodes = Vec::with_capacity(ids.len());
    let entry = if index == 0 {
        json!({ "type": "start", "data": { "command": "/start" } })
    } else {
        *commands += 1;
        json!({
            "type": "command",
            "data": {
                "command": format!("/section{}", commands),
                "description": format!("Section {}", commands),
                "showInMenu": true,
            },
        })
    };
    nodes.push(with_identity(entry, &ids[0], 0, rng));

    for (n, id) in ids.iter().enumerate().skip(1) {
        let node = match rng.random_range(0..10) {
            0..=5 => generate_message(rng),
            6 | 7 => generate_input(rng, &ids),
            8 => generate_media(rng),
            _ => {
                *commands += 1;
                json!({
                    "type": "command",
                    "data": {
                        "command": format!("/cmd{}", commands),
                        "description": sentence(rng, 3),
                        "showInMenu": rng.random_bool(0.5),
                    },
                })
            }
        };
        nodes.push(with_identity(node, id, n, rng));
    }

    // Every node gets a few buttons pointing somewhere on this sheet.
    for node in nodes.iter_mut() {
        let buttons = generate_buttons(rng, &ids);
        if !buttons.is_empty() {
            node["data"]["buttons"] = Value::Array(buttons);
            node["data"]["keyboardType"] = json!(if rng.random_bool(0.7) {
                "inline"
            } else {
                "reply"
            });
        }
    }

    let connections: Vec<Value> = ids
        .windows(2)
        .filter(|_| rng.random_bool(0.5))
        .map(|pair| json!({ "source": pair[0], "target": pair[1] }))
        .collect();

    let sheet = json!({
        "id": sheet_id,
        "name": format!("Sheet {}", index + 1),
        "nodes": nodes,
        "connections": connections,
    });
    (sheet, (sheet_id, ids[0].clone()))
}

fn with_identity(mut node: Value, id: &str, n: usize, rng: &mut StdRng) -> Value {
    node["id"] = json!(id);
    node["position"] = json!({
        "x": (n % 5) as f64 * 250.0 + rng.random_range(0.0..40.0),
        "y": (n / 5) as f64 * 200.0 + rng.random_range(0.0..40.0),
    });
    if node["data"].get("text").is_none() {
        node["data"]["text"] = json!(sentence(rng, 6));
    }
    node
}

fn generate_message(rng: &mut StdRng) -> Value {
    let mut text = sentence(rng, 8);
    if rng.random_bool(0.3) {
        text.push_str(", {user_name}");
    }
    if rng.random_bool(0.3) {
        let variable = VARIABLES.choose(rng).copied().unwrap_or("name");
        text.push_str(&format!(" ({{{}}})", variable));
    }
    json!({
        "type": "message",
        "data": { "text": text, "markdown": rng.random_bool(0.2) },
    })
}

fn generate_input(rng: &mut StdRng, ids: &[String]) -> Value {
    let variable = VARIABLES.choose(rng).copied().unwrap_or("name");
    let mut data = json!({
        "text": format!("Please enter your {}", variable),
        "inputVariable": variable,
    });
    if let Some(next) = ids.choose(rng) {
        data["inputTargetNodeId"] = json!(next);
    }
    json!({ "type": "input", "data": data })
}

fn generate_media(rng: &mut StdRng) -> Value {
    let media_type = MEDIA_TYPES.choose(rng).copied().unwrap_or("photo");
    json!({
        "type": "media",
        "data": {
            "mediaType": media_type,
            "mediaUrl": format!("https://example.com/{}.bin", rng.random_range(1..1000)),
            "text": sentence(rng, 4),
        },
    })
}

fn generate_buttons(rng: &mut StdRng, ids: &[String]) -> Vec<Value> {
    let count = rng.random_range(0..=3);
    (0..count)
        .filter_map(|i| {
            let target = ids.choose(rng)?;
            Some(json!({
                "id": format!("btn_{}", i),
                "text": format!("{} {}", sentence(rng, 2), i + 1),
                "action": "goto",
                "target": target,
            }))
        })
        .collect()
}

fn sentence(rng: &mut StdRng, words: usize) -> String {
    (0..words)
        .filter_map(|_| WORDS.choose(rng).copied())
        .collect::<Vec<_>>()
        .join(" ")
}
