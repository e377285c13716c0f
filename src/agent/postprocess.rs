//! Response post-processing
//!
//! Two jobs before a generated answer reaches the client:
//! 1. Promote image URLs (labeled fields, bare image links, known image
//!    hosts) into embeddable markdown images, each URL at most once.
//! 2. Scrub any internal-processing scaffolding that leaked out of the
//!    orchestration loop's intermediate directives.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Telltale fragments of the loop's internal directives. The loop uses these
/// to detect leaked scaffolding in model output, and the scrubber removes
/// any line still carrying one. Must stay in sync with the directive text
/// built in `build_processing_directive` and the synthesis prompt.
pub const SCAFFOLD_MARKERS: &[&str] = &[
    "INTERNAL PROCESSING",
    "What additional tools should be called",
    "The following tool results were just obtained",
    "do not include this section in your reply",
    "Do not mention tool results or internal processing",
];

static LABELED_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*\*(Avatar|Image|Logo):\*\*\s*(https?://[^\s)<>]+)").expect("valid regex")
});

static BARE_IMAGE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)https?://[^\s)<>"']+\.(?:png|jpe?g|gif|webp|svg)(?:\?[^\s)<>"']*)?"#)
        .expect("valid regex")
});

static HOSTED_IMAGE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"https?://(?:[A-Za-z0-9.-]+\.)?(?:imgur\.com|ipfs\.io|cloudflare-ipfs\.com|lh3\.googleusercontent\.com|openseauserdata\.com|metadata\.ens\.domains)/[^\s)<>"']+"#,
    )
    .expect("valid regex")
});

static EXISTING_EMBED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*\]\((https?://[^)]+)\)").expect("valid regex"));

/// Full cleanup pass: image promotion, scaffolding scrub, whitespace trim
pub fn clean(text: &str) -> String {
    let promoted = promote_images(text);
    let scrubbed = scrub_scaffolding(&promoted);
    scrubbed.trim().to_string()
}

/// True when the text echoes one of the internal directive fragments
pub fn contains_scaffolding(text: &str) -> bool {
    SCAFFOLD_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Append a markdown image below each line carrying an image URL.
/// Label-prefixed matches win over bare-URL matches for the same URL, and a
/// URL already embedded anywhere in the text is never embedded again, so
/// running this twice adds nothing.
fn promote_images(text: &str) -> String {
    // Labeled URLs claim their embed slot first, document-wide, so a bare
    // occurrence of the same URL elsewhere never double-embeds it
    let labeled: Vec<(String, String)> = LABELED_IMAGE
        .captures_iter(text)
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .collect();
    let labeled_urls: HashSet<&str> = labeled.iter().map(|(_, url)| url.as_str()).collect();

    let mut out = String::with_capacity(text.len());
    let mut embedded: HashSet<String> = EXISTING_EMBED
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect();

    for line in text.lines() {
        out.push_str(line);
        out.push('\n');

        let mut line_embeds: Vec<(String, String)> = Vec::new();

        for caps in LABELED_IMAGE.captures_iter(line) {
            let url = caps[2].to_string();
            if !embedded.contains(&url) {
                embedded.insert(url.clone());
                line_embeds.push((caps[1].to_string(), url));
            }
        }
        for m in BARE_IMAGE_URL.find_iter(line) {
            let url = m.as_str().to_string();
            if !embedded.contains(&url) && !labeled_urls.contains(url.as_str()) {
                embedded.insert(url.clone());
                line_embeds.push(("image".to_string(), url));
            }
        }
        for m in HOSTED_IMAGE_URL.find_iter(line) {
            let url = m.as_str().to_string();
            if !embedded.contains(&url) && !labeled_urls.contains(url.as_str()) {
                embedded.insert(url.clone());
                line_embeds.push(("image".to_string(), url));
            }
        }

        for (label, url) in line_embeds {
            out.push_str(&format!("![{}]({})\n", label, url));
        }
    }

    // lines() drops a trailing newline; keep output stable either way
    if !text.ends_with('\n') && out.ends_with('\n') {
        out.pop();
    }
    out
}

/// Drop every line still carrying an internal directive fragment
fn scrub_scaffolding(text: &str) -> String {
    text.lines()
        .filter(|line| !SCAFFOLD_MARKERS.iter().any(|marker| line.contains(marker)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labeled_avatar_is_promoted() {
        let text = "**Avatar:** https://metadata.ens.domains/mainnet/avatar/vitalik.eth";
        let cleaned = clean(text);
        assert!(cleaned.contains(
            "![Avatar](https://metadata.ens.domains/mainnet/avatar/vitalik.eth)"
        ));
    }

    #[test]
    fn bare_image_url_is_promoted_once() {
        let text = "Here is the logo: https://example.com/token.png and more text";
        let cleaned = clean(text);
        assert_eq!(cleaned.matches("![image](https://example.com/token.png)").count(), 1);
    }

    #[test]
    fn hosted_domain_url_is_promoted() {
        let text = "See https://ipfs.io/ipfs/QmHash/item";
        let cleaned = clean(text);
        assert!(cleaned.contains("![image](https://ipfs.io/ipfs/QmHash/item)"));
    }

    #[test]
    fn labeled_match_wins_over_bare_extension_match() {
        // URL qualifies as both a labeled field and a bare .png link; the
        // label pass claims it and exactly one embed appears
        let text = "**Image:** https://example.com/nft.png";
        let cleaned = clean(text);
        assert_eq!(cleaned.matches("](https://example.com/nft.png)").count(), 1);
        assert!(cleaned.contains("![Image](https://example.com/nft.png)"));
    }

    #[test]
    fn promotion_is_idempotent() {
        let text = "**Avatar:** https://example.com/pic.png\nAlso https://i.imgur.com/abc123";
        let once = clean(text);
        let twice = clean(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn repeated_url_is_embedded_once() {
        let text = "https://example.com/a.png\nAgain: https://example.com/a.png";
        let cleaned = clean(text);
        assert_eq!(cleaned.matches("![image](https://example.com/a.png)").count(), 1);
    }

    #[test]
    fn scaffolding_lines_are_scrubbed() {
        let text = "Your balance is 2 ETH.\nINTERNAL PROCESSING — do not include this section in your reply.\nWhat additional tools should be called, if any?";
        let cleaned = clean(text);
        assert_eq!(cleaned, "Your balance is 2 ETH.");
        assert!(!contains_scaffolding(&cleaned));
    }

    #[test]
    fn detection_matches_every_marker() {
        for marker in SCAFFOLD_MARKERS {
            assert!(contains_scaffolding(&format!("prefix {} suffix", marker)));
        }
        assert!(!contains_scaffolding("a normal answer about gas prices"));
    }

    #[test]
    fn plain_text_passes_through() {
        let text = "Gas is currently 12 gwei on Ethereum.";
        assert_eq!(clean(text), text);
    }
}
