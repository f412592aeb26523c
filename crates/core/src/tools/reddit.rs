//! Subreddit news lookup tool for the Reddit scout agent.

use rand::seq::IndexedRandom;
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, tool::Parameters},
    model::{ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

const MAX_MOCK_TITLES: usize = 10;
const LIVE_POST_LIMIT: usize = 5;
const REDDIT_BASE_URL: &str = "https://www.reddit.com";

/// Where headlines come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedditSource {
    /// A fixed, offline table of headlines.
    Mock,
    /// The public Reddit listing API.
    Live { user_agent: String, base_url: String },
}

impl RedditSource {
    pub fn live(user_agent: impl Into<String>) -> Self {
        Self::Live {
            user_agent: user_agent.into(),
            base_url: REDDIT_BASE_URL.to_string(),
        }
    }
}

fn mock_titles(subreddit: &str) -> Option<&'static [&'static str]> {
    let titles: &'static [&'static str] = match subreddit {
        "hvac" => &[
            "R-32 transition timeline: what A2L refrigerants mean for recertification",
            "Heat pump rebates for 2025: federal credits and state programs compared",
            "Variable-speed compressors are now the default in mid-tier lines",
            "Duct leakage testing requirements tightened in new energy codes",
            "Smart thermostat callbacks: common wiring mistakes on C-wire installs",
        ],
        "contractors" => &[
            "Lumber prices steady for the third straight quarter",
            "Subcontractor shortages push residential timelines out by weeks",
            "Permit backlogs: cities adopting online plan review",
            "Estimating software round-up: what crews actually use",
            "Insurance premiums rising for small general contractors",
        ],
        "construction" => &[
            "Modular construction share grows in multifamily projects",
            "Jobsite safety: new fall protection guidance released",
            "Concrete curing sensors cut schedule risk on slab pours",
            "Equipment rental rates climb as demand outpaces supply",
        ],
        "electricians" => &[
            "NEC 2023 adoption status by state",
            "Panel upgrades surge alongside EV charger installs",
            "Arc-fault nuisance tripping: field fixes that work",
        ],
        "plumbing" => &[
            "Tankless water heater descaling intervals in hard water areas",
            "PEX vs copper: cost comparison for repipes this year",
            "Lead service line replacement funding opens new work",
        ],
        _ => return None,
    };
    Some(titles)
}

/// Picks up to ten headlines at random from the offline table.
pub fn get_mock_reddit_news(subreddit: &str) -> Value {
    let normalized = subreddit.trim().to_lowercase();
    info!(subreddit = %normalized, "Serving mock subreddit headlines");
    match mock_titles(&normalized) {
        Some(available) => {
            let count = MAX_MOCK_TITLES.min(available.len());
            let selected: Vec<&str> = available
                .choose_multiple(&mut rand::rng(), count)
                .copied()
                .collect();
            json!({ subreddit: selected })
        }
        None => json!({
            subreddit: format!(
                "Sorry, I don't have information on the subreddit '{}'. Please check the subreddit name.",
                subreddit
            )
        }),
    }
}

/// Extracts post titles from a Reddit listing response.
fn parse_listing_titles(listing: &Value) -> Vec<String> {
    listing["data"]["children"]
        .as_array()
        .map(|children| {
            children
                .iter()
                .filter_map(|child| child["data"]["title"].as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Fetches the current hot posts of a subreddit from Reddit.
///
/// Failures are folded into the returned value so the model can report them;
/// they never fail the tool call.
pub async fn get_live_reddit_news(subreddit: &str, user_agent: &str, base_url: &str) -> Value {
    info!(%subreddit, "Fetching subreddit headlines from Reddit");
    let url = format!(
        "{}/r/{}/hot.json?limit={}",
        base_url.trim_end_matches('/'),
        subreddit,
        LIVE_POST_LIMIT
    );

    let response = reqwest::Client::new()
        .get(&url)
        .header(reqwest::header::USER_AGENT, user_agent)
        .send()
        .await
        .and_then(|r| r.error_for_status());

    let listing = match response {
        Ok(response) => response.json::<Value>().await,
        Err(e) => {
            warn!(%subreddit, error = %e, "Reddit request failed");
            return json!({
                subreddit: [format!(
                    "Error accessing r/{}. It might be private, banned, or non-existent. Details: {}",
                    subreddit, e
                )]
            });
        }
    };

    match listing {
        Ok(listing) => {
            let titles = parse_listing_titles(&listing);
            if titles.is_empty() {
                json!({ subreddit: [format!("No recent hot posts found in r/{}.", subreddit)] })
            } else {
                json!({ subreddit: titles })
            }
        }
        Err(e) => json!({
            subreddit: format!("Error: Unable to read the Reddit response. {}", e)
        }),
    }
}

/// Arguments for the `get_reddit_news` tool.
#[derive(Deserialize, JsonSchema, Debug)]
pub struct RedditNewsArgs {
    /// Subreddit name without the `r/` prefix.
    #[schemars(description = "The subreddit to fetch news from, e.g. 'hvac' or 'contractors'")]
    pub subreddit: String,
}

/// MCP service exposing the subreddit news tool.
pub struct RedditNewsService {
    source: RedditSource,
    tool_router: ToolRouter<Self>,
}

#[tool_handler]
impl ServerHandler for RedditNewsService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[tool_router]
impl RedditNewsService {
    pub fn new(source: RedditSource) -> Self {
        Self {
            source,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Fetch the top post titles from a subreddit related to contractor and HVAC news."
    )]
    pub async fn get_reddit_news(
        &self,
        args: Parameters<RedditNewsArgs>,
    ) -> Result<String, String> {
        let subreddit = args.0.subreddit.trim().trim_start_matches("r/");
        if subreddit.is_empty() {
            return Err("A subreddit name is required.".to_string());
        }
        let news = match &self.source {
            RedditSource::Mock => get_mock_reddit_news(subreddit),
            RedditSource::Live {
                user_agent,
                base_url,
            } => get_live_reddit_news(subreddit, user_agent, base_url).await,
        };
        serde_json::to_string(&news).map_err(|e| format!("Failed to serialize news: {}", e))
    }
}
