//! Prompt builders for the three LLM calls the service makes.
//!
//! Each builder embeds its output contract directly in the prompt text:
//! the search prompts demand a bare JSON object, the judge prompt demands
//! a single `Ecoscore:` line. Builders are pure and never fail; missing
//! fields are replaced with placeholder strings so the result is always a
//! single opaque text blob.

/// Retailer domains the alternatives search is scoped to.
pub const RETAILER_SITES: &[&str] = &[
    "amazon.com",
    "amazon.co.uk",
    "amazon.de",
    "amazon.fr",
    "amazon.ca",
    "amazon.com.au",
];

/// Topic used when the caller's query is blank.
const DEFAULT_TOPIC: &str = "environmentally friendlier everyday products";

/// JSON shape the search prompts request from the model.
const RESULTS_CONTRACT: &str = concat!(
    "Produce ONLY JSON with this shape exactly:\n",
    r#"{ "results": [ { "name": "Product or Brand Name", "url": "https://...", "price": "$12.99" } ] }"#,
    "\nThe price field is optional; omit it when unknown.\n",
    "Do not include explanations or markdown, only valid JSON."
);

/// Prompt for a free-text topic search.
pub fn search_prompt(topic: &str, max_results: usize) -> String {
    let topic = topic.trim();
    let topic = if topic.is_empty() { DEFAULT_TOPIC } else { topic };
    format!(
        "User topic: {topic}\n\n\
         Use web_search to find environmentally friendlier product options for the user's topic.\n\
         Focus on credible official product or brand pages, sustainability certifications, and lifecycle considerations.\n\
         Return up to {max_results} distinct results.\n\
         {RESULTS_CONTRACT}"
    )
}

/// Prompt for finding greener alternatives to a specific product.
pub fn alternatives_prompt(product_name: &str, product_link: &str, max_results: usize) -> String {
    let name_line = product_line("Original product", product_name, "(unknown name)");
    let link_line = product_line("Original link", product_link, "(none provided)");
    let site_scope = RETAILER_SITES
        .iter()
        .map(|site| format!("site:{site}"))
        .collect::<Vec<_>>()
        .join(" OR ");
    format!(
        "{name_line}\n{link_line}\n\n\
         Using web_search, find environmentally friendlier alternatives to the given product.\n\
         Prioritize durable, reusable, recyclable, compostable, or certified-sustainable materials (e.g., paper, metal, bamboo, glass, silicone when appropriate).\n\
         Only return product pages on these retailers, by including {site_scope} in the search query.\n\
         Return up to {max_results} distinct alternatives.\n\
         {RESULTS_CONTRACT}"
    )
}

/// Prompt asking the model to score one product's environmental
/// friendliness with a single `Ecoscore:` line.
pub fn judge_prompt(product_name: &str, product_link: &str) -> String {
    let name_line = product_line("Product", product_name, "(unknown name)");
    let link_line = product_line("Link", product_link, "(none provided)");
    format!(
        "{name_line}\n{link_line}\n\n\
         Rate the product's environmental friendliness with a single Ecoscore between 1.0 and 5.0 (decimals allowed).\n\
         Use this rubric strictly:\n\
         1.0-1.9: predominantly single-use plastic; non-recyclable; no credible sustainability claims.\n\
         2.0-2.9: disposable plastic-heavy; limited recyclability or greenwashing; short lifespan.\n\
         3.0-3.9: mixed/unknown materials; partial recyclability; some reuse potential; average footprint.\n\
         4.0-4.4: largely sustainable materials (paper, glass, silicone), reusable or recyclable; credible claims.\n\
         4.5-5.0: highly sustainable (durable metal/bamboo/glass, certified compostable), long lifespan, minimal waste.\n\
         Consider materials, reusability, recyclability/compostability, lifecycle/durability, packaging, and certifications.\n\
         If the product appears to be paper drinking straws, ensure Ecoscore >= 4.5 barring contradictory evidence.\n\
         Respond ONLY with: Ecoscore: <number> (e.g., Ecoscore: 4.5). No explanations."
    )
}

fn product_line(label: &str, value: &str, placeholder: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        format!("{label}: {placeholder}")
    } else {
        format!("{label}: {value}")
    }
}
