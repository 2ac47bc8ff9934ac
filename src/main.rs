//! # Quire CLI
//!
//! Usage:
//!   quire input.json -o output.html
//!   echo '{ ... }' | quire -o output.html
//!   quire --example > agreement.json
//!   quire input.json --summary

use std::env;
use std::fs;
use std::io::{self, Read};

use quire::balance::Balancer;
use quire::measure::TextMeasurer;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_agreement_json());
        return;
    }

    let input = if args.len() > 1 && !args[1].starts_with('-') {
        fs::read_to_string(&args[1]).expect("Failed to read input file")
    } else {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).expect("Failed to read stdin");
        buf
    };

    let output_path = args
        .windows(2)
        .find(|w| w[0] == "-o")
        .map(|w| w[1].clone())
        .unwrap_or_else(|| "output.html".to_string());

    let measurer = TextMeasurer::new();
    let doc = match quire::compose_json(&input, &measurer) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };

    if args.iter().any(|a| a == "--summary") {
        let balancer = Balancer::new(&measurer);
        let (_, content_height) = doc.content_size();
        eprintln!("{} sheet(s)", doc.sheets.len());
        for i in 0..doc.sheets.len() {
            let used = balancer.used_height(&doc, i);
            eprintln!(
                "  sheet {}: {} block(s), {:.0}% full",
                i + 1,
                doc.sheets[i].blocks.len(),
                used / content_height * 100.0
            );
        }
    }

    match quire::render::render_html(&doc) {
        Ok(html) => {
            fs::write(&output_path, &html).expect("Failed to write output");
            eprintln!("✓ Written {} bytes to {}", html.len(), output_path);
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    }
}

fn example_agreement_json() -> &'static str {
    r##"{
  "format": "a4Portrait",
  "chrome": {
    "letterhead": {
      "company": "Apex Broadcasting",
      "addressLines": ["12 Harbour Road", "Wellington 6011"]
    },
    "qrPayload": "https://apex.example/agreement/verify?qrid=AGR-2026-014",
    "showPageNumbers": true
  },
  "metadata": {
    "title": "Service Agreement",
    "author": "Apex Broadcasting"
  },
  "blocks": [
    {
      "type": "paragraph",
      "align": "center",
      "runs": [
        { "text": "SERVICE AGREEMENT", "marks": { "bold": true, "fontSize": 22 } }
      ]
    },
    {
      "type": "paragraph",
      "align": "center",
      "runs": [
        { "text": "Between Apex Broadcasting and Northwind Studios" }
      ]
    },
    { "type": "divider" },
    {
      "type": "paragraph",
      "runs": [
        { "text": "1. Scope of Services. ", "marks": { "bold": true } },
        { "text": "The provider agrees to deliver editorial and post-production services for the client's weekly programme, including review cycles and final delivery in the agreed broadcast format." }
      ]
    },
    {
      "type": "paragraph",
      "runs": [
        { "text": "2. Term. ", "marks": { "bold": true } },
        { "text": "This agreement commences on the effective date and continues for twelve months unless terminated earlier under clause 6." }
      ]
    },
    {
      "type": "list",
      "kind": "unordered",
      "items": [
        [ { "text": "Weekly delivery no later than Thursday 17:00" } ],
        [ { "text": "Two revision rounds included per episode" } ],
        [ { "text": "Source material retained for ninety days" } ]
      ]
    },
    {
      "type": "table",
      "borderWidth": 1,
      "borderColor": { "r": 0.47, "g": 0.47, "b": 0.47 },
      "header": ["Milestone", "Due", "Fee"],
      "rows": [
        ["Pilot episode", "2026-04-01", "4,500.00"],
        ["Season delivery", "2026-09-30", "38,000.00"]
      ]
    },
    {
      "type": "paragraph",
      "runs": [
        { "text": "3. Confidentiality. ", "marks": { "bold": true } },
        { "text": "Each party shall keep the other party's confidential information secret and use it only for the purposes of this agreement." }
      ]
    }
  ]
}"##
}
