//! Real-estate browsing and market research
//!
//! Static site tables, intent detection over user lines, the browser setup
//! scripts handed to the Playwright tool server, and the [`ResearchPlanner`]
//! that turns a user line into a site-search or research prompt.

use std::sync::Mutex;

use anyhow::Result;
use rand::seq::SliceRandom;
use regex::Regex;

use crate::cli::TurnPlanner;

pub const SYSTEM_PROMPT: &str = r#"You are a real estate assistant that can browse property websites to find listings matching user criteria.
You have access to the following real estate websites:
- magicbricks.com
- 99acres.com
- housing.com
- nobroker.com

When a user asks about properties:
1. Determine their requirements (location, property type, budget, etc.)
2. Choose which website(s) to search based on their query
3. Use the browser_navigate tool to go to the appropriate website
4. Use browser_snapshot to analyze the page
5. Interact with search fields, filters, and listings using browser_click, browser_type, etc.
6. Collect information about matching properties and present it to the user

For each property, try to provide:
- Price
- Location
- Size/area
- Number of bedrooms
- Key amenities
- Link to the listing

When comparing properties, organize them clearly by price, location, or features as appropriate."#;

pub const RESEARCH_SYSTEM_PROMPT: &str = r#"You are a real estate assistant that can browse property websites to find listings matching user criteria and perform in-depth research about real estate markets.

You have access to the following real estate websites:
- magicbricks.com
- 99acres.com
- housing.com
- nobroker.com

When a user asks about properties:
1. Determine their requirements (location, property type, budget, etc.)
2. Choose which website(s) to search based on their query
3. Use the browser_navigate tool to go to the appropriate website
4. Use browser_snapshot to analyze the page
5. Interact with search fields, filters, and listings using browser_click, browser_type, etc.
6. Collect information about matching properties and present it to the user

For each property, try to provide:
- Price
- Location
- Size/area
- Number of bedrooms
- Key amenities
- Link to the listing

When the user asks for research about real estate markets, trends, or advice:
1. Use the claude_research tool to gather up-to-date information
2. Provide well-researched, factual information about:
   - Market trends in specific neighborhoods or cities
   - Price comparisons between areas
   - Investment potential
   - Rental yield expectations
   - Regulatory considerations
   - Legal aspects of property transactions in India

When comparing properties, organize them clearly by price, location, or features as appropriate.
Combine your browsing capabilities and research tools to provide comprehensive assistance."#;

/// Sent once before the conversation; the reply is only logged
pub const INSTALL_PROMPT: &str = "Please run the browser installation command to ensure Playwright is set up correctly.\nUse the browser_install function.";

pub const INITIAL_PROMPT: &str = r#"I'm a real estate browsing assistant. I can help you find properties on websites like:
- magicbricks.com
- 99acres.com
- housing.com
- nobroker.com

Tell me what kind of property you're looking for (buy/rent, location, budget, size,
number of bedrooms, etc.) and I'll browse these sites to find matching options.

You can also specify which website you prefer, or I can search across multiple sites.

Type 'exit', 'quit', or 'bye' to end the session."#;

pub const RESEARCH_INITIAL_PROMPT: &str = r#"I'm a real estate browsing and research assistant. I can help you in two main ways:

1. Find properties on websites like:
   - magicbricks.com
   - 99acres.com
   - housing.com
   - nobroker.com

2. Provide in-depth research on real estate topics:
   - Market trends and price movements
   - Investment opportunities and rental yields
   - Location analysis and neighborhood comparisons
   - Legal considerations and RERA regulations
   - Home loan information and interest rates

Tell me what you're looking for, whether it's specific properties (location, budget, type)
or market research, and I'll help you find what you need.

Type 'exit', 'quit', or 'bye' to end the session."#;

/// Sent after a failed turn so a stuck browser does not linger
pub const CLOSE_BROWSER_PROMPT: &str = "Please close the browser using browser_close";

/// Site key and base URL
pub const WEBSITES: [(&str, &str); 4] = [
    ("magicbricks", "https://www.magicbricks.com"),
    ("99acres", "https://www.99acres.com"),
    ("housing", "https://housing.com"),
    ("nobroker", "https://www.nobroker.in"),
];

/// Site key with its buy and rent path templates; `{city}` is the site's city slug
const SEARCH_TEMPLATES: [(&str, &str, &str); 4] = [
    ("magicbricks", "/property-for-sale/{city}/", "/property-for-rent/{city}/"),
    ("99acres", "/search/property/buy/{city}-all/", "/search/property/rent/{city}-all/"),
    ("housing", "/in/{city}/buy-property-in-{city}", "/in/{city}/rent-property-in-{city}"),
    ("nobroker", "/{city}/buy/", "/{city}/rent/"),
];

/// City slugs that differ from the plain city name, per site
const CITY_MAPPINGS: [(&str, &str, &str); 4] = [
    ("delhi", "magicbricks", "delhi-ncr"),
    ("delhi", "99acres", "delhi-ncr"),
    ("delhi", "housing", "delhi-ncr"),
    ("delhi", "nobroker", "delhi"),
];

pub const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36 Edg/119.0.0.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/119.0",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

const fn geo(latitude: f64, longitude: f64) -> GeoPoint {
    GeoPoint { latitude, longitude }
}

/// Known places, matched in this order against user input
pub const CITY_GEOLOCATION: [(&str, GeoPoint); 8] = [
    ("bangalore", geo(12.9716, 77.5946)),
    ("mumbai", geo(19.0760, 72.8777)),
    ("delhi", geo(28.7041, 77.1025)),
    ("hyderabad", geo(17.3850, 78.4867)),
    ("chennai", geo(13.0827, 80.2707)),
    ("pune", geo(18.5204, 73.8567)),
    // HSR Layout and Bellandur are Bangalore neighborhoods
    ("hsr", geo(12.9116, 77.6521)),
    ("bellandur", geo(12.9282, 77.6776)),
];

/// Where the browser pretends to be when no city was mentioned
pub const DEFAULT_CITY: &str = "bangalore";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingMode {
    Buy,
    Rent,
}

impl ListingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingMode::Buy => "buy",
            ListingMode::Rent => "rent",
        }
    }

    /// Site searched for this mode: nobroker for rentals, 99acres for sales
    pub fn preferred_site(&self) -> &'static str {
        match self {
            ListingMode::Rent => "nobroker",
            ListingMode::Buy => "99acres",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResearchTopic {
    MarketTrends,
    Investment,
    Locations,
    Legal,
    Loans,
}

impl ResearchTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResearchTopic::MarketTrends => "market_trends",
            ResearchTopic::Investment => "investment",
            ResearchTopic::Locations => "locations",
            ResearchTopic::Legal => "legal",
            ResearchTopic::Loans => "loans",
        }
    }
}

/// Topic keywords, checked in order; the first topic with a hit wins
pub const RESEARCH_TOPICS: [(ResearchTopic, &[&str]); 5] = [
    (
        ResearchTopic::MarketTrends,
        &[
            "real estate trends",
            "property price trends",
            "housing market",
            "market forecast",
            "property appreciation",
            "real estate bubble",
            "market crash",
            "market recovery",
        ],
    ),
    (
        ResearchTopic::Investment,
        &[
            "real estate investment",
            "rental yield",
            "roi",
            "property investment",
            "buy vs rent",
            "investment strategy",
            "property portfolio",
        ],
    ),
    (
        ResearchTopic::Locations,
        &[
            "best areas to invest",
            "upcoming localities",
            "neighborhood analysis",
            "location factors",
            "gated communities",
            "proximity to amenities",
        ],
    ),
    (
        ResearchTopic::Legal,
        &[
            "property laws india",
            "real estate regulations",
            "rera",
            "property documents",
            "title deed",
            "property tax",
            "stamp duty",
            "registration charges",
        ],
    ),
    (
        ResearchTopic::Loans,
        &[
            "home loan",
            "mortgage",
            "interest rates",
            "loan eligibility",
            "down payment",
            "loan tenure",
            "prepayment",
            "foreclosure",
        ],
    ),
];

/// Words that mark a line as a research request rather than a listing search
const RESEARCH_INDICATORS: [&str; 10] = [
    "research",
    "information",
    "data",
    "statistics",
    "report",
    "trends",
    "forecast",
    "outlook",
    "analysis",
    "insights",
];

/// Base URL of a site key
pub fn website_url(site: &str) -> Option<&'static str> {
    WEBSITES.iter().find(|(key, _)| *key == site).map(|(_, url)| *url)
}

/// A city's slug on a site; unmapped cities use their own name
pub fn city_slug(city: &str, site: &str) -> String {
    let city = city.trim().to_lowercase();
    CITY_MAPPINGS
        .iter()
        .find(|(c, s, _)| *c == city && *s == site)
        .map(|(_, _, slug)| slug.to_string())
        .unwrap_or(city)
}

/// Listing search URL for a site, mode and city
pub fn search_url(site: &str, mode: ListingMode, city: &str) -> Option<String> {
    let base = website_url(site)?;
    let (_, buy, rent) = SEARCH_TEMPLATES.iter().find(|(key, _, _)| *key == site)?;
    let template = match mode {
        ListingMode::Buy => buy,
        ListingMode::Rent => rent,
    };
    Some(format!("{}{}", base, template.replace("{city}", &city_slug(city, site))))
}

pub fn geolocation(city: &str) -> Option<GeoPoint> {
    let city = city.to_lowercase();
    CITY_GEOLOCATION
        .iter()
        .find(|(name, _)| *name == city)
        .map(|(_, point)| *point)
}

/// First known place mentioned in the input
pub fn detect_location(input: &str) -> Option<&'static str> {
    let lowered = input.to_lowercase();
    CITY_GEOLOCATION
        .iter()
        .map(|(name, _)| *name)
        .find(|name| lowered.contains(name))
}

/// Research topic asked about, if the line is a research request at all
///
/// A line counts as research when it contains an indicator word. The topic
/// is then the first one with a matching keyword, or market trends.
pub fn detect_research_intent(input: &str) -> Option<ResearchTopic> {
    let lowered = input.to_lowercase();

    if !RESEARCH_INDICATORS.iter().any(|word| lowered.contains(word)) {
        return None;
    }

    let topic = RESEARCH_TOPICS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(topic, _)| *topic)
        .unwrap_or(ResearchTopic::MarketTrends);
    Some(topic)
}

/// Question sent to the research tool for a topic
pub fn research_query(topic: ResearchTopic, location: Option<&str>) -> String {
    let place = location.unwrap_or("India");
    match topic {
        ResearchTopic::MarketTrends => format!(
            "What are the current real estate trends in {}? Include price trends, demand-supply dynamics, and future outlook.",
            place
        ),
        ResearchTopic::Investment => format!(
            "What are the best real estate investment opportunities in {} right now? Include ROI analysis and rental yield expectations.",
            place
        ),
        ResearchTopic::Locations => match location {
            Some(location) => format!(
                "What are the best neighborhoods to invest in {}? Which areas are up-and-coming vs established?",
                location
            ),
            None => "What are the fastest growing real estate markets in India? Which cities offer the best investment potential?".to_string(),
        },
        ResearchTopic::Legal => format!(
            "What are the important legal considerations for real estate transactions in {}? Include RERA regulations and documentation requirements.",
            place
        ),
        ResearchTopic::Loans => "What are the current home loan interest rates offered by major banks in India? What are the eligibility criteria and documentation requirements?".to_string(),
    }
}

const PERMISSIONS_SCRIPT: &str = r#"// Hide Webdriver flag to prevent bot detection
Object.defineProperty(navigator, 'webdriver', { get: () => false });

// Set user agent
const userAgent = "__USER_AGENT__";
Object.defineProperty(navigator, 'userAgent', { get: () => userAgent });

// Mock geolocation API
const position = {
  coords: {
    latitude: __LATITUDE__,
    longitude: __LONGITUDE__,
    accuracy: 100,
    altitude: null,
    altitudeAccuracy: null,
    heading: null,
    speed: null
  },
  timestamp: Date.now()
};
navigator.geolocation = {
  getCurrentPosition: (success) => success(position),
  watchPosition: (success) => { success(position); return 0; },
  clearWatch: () => {}
};

// Override permissions API to always return granted
if (navigator.permissions) {
  navigator.permissions.query = (parameters) => {
    return Promise.resolve({ state: 'granted', onchange: null });
  };
}

console.log("Browser permissions and identity configured successfully");"#;

pub const COOKIE_CONSENT_BYPASS_SCRIPT: &str = r#"function bypassCookieConsent() {
  const cookieSelectors = [
    'button[id*="accept"], button[class*="accept"], button[id*="cookie"], button[class*="cookie"]',
    'a[id*="accept"], a[class*="accept"], a[id*="cookie"], a[class*="cookie"]',
    'button[class*="close"], a[class*="close"], div[class*="close"]',
    '.cc-accept', '#cookieAccept', '.cookie-accept', '#cookie-banner button',
    '#onetrust-accept-btn-handler',
    '.js-accept-cookies',
    '.cookieNotification__Button', '.cookie-accept-btn',
    '.modal-close', '.popup-close'
  ];

  for (const selector of cookieSelectors) {
    for (const el of document.querySelectorAll(selector)) {
      if (el.innerText && el.innerText.match(/accept|agree|allow|consent|okay|got it|i understand|yes/i)) {
        el.click();
        return true;
      }
    }
  }

  const allButtons = document.querySelectorAll('button, a.button, input[type="button"], input[type="submit"]');
  for (const button of allButtons) {
    if (button.innerText && button.innerText.match(/accept|agree|allow|cookies|consent|okay|got it|i understand|yes/i)) {
      if (!button.innerText.match(/decline|reject|not now|dismiss/i)) {
        button.click();
        return true;
      }
    }
  }

  return false;
}

bypassCookieConsent();

const overlaySelectors = ['.overlay', '.modal', '.popup', '.cookie-banner', '.cookie-policy', '.consent-popup'];
for (const selector of overlaySelectors) {
  for (const el of document.querySelectorAll(selector)) {
    el.style.display = 'none';
  }
}

document.body.style.overflow = 'auto';
document.documentElement.style.overflow = 'auto';"#;

pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Script that hides automation, fixes the user agent and fakes a location
pub fn permissions_script(user_agent: &str, location: GeoPoint) -> String {
    PERMISSIONS_SCRIPT
        .replace("__USER_AGENT__", user_agent)
        .replace("__LATITUDE__", &location.latitude.to_string())
        .replace("__LONGITUDE__", &location.longitude.to_string())
}

/// Geolocation override for one city
pub fn geolocation_script(city: &str, location: GeoPoint) -> String {
    format!(
        r#"// Override geolocation for {city}
navigator.geolocation = {{
  getCurrentPosition: (success) => success({{
    coords: {{
      latitude: {lat},
      longitude: {lon},
      accuracy: 100,
      altitude: null,
      altitudeAccuracy: null,
      heading: null,
      speed: null
    }},
    timestamp: Date.now()
  }}),
  watchPosition: () => 0,
  clearWatch: () => {{}}
}};
console.log("Geolocation set to {city}");"#,
        city = city,
        lat = location.latitude,
        lon = location.longitude
    )
}

/// Warm-up prompt for the research profile: install the browser and run
/// the permissions script with a random user agent
pub fn browser_setup_prompt() -> String {
    let user_agent = random_user_agent();
    let location = geolocation(DEFAULT_CITY).unwrap_or(CITY_GEOLOCATION[0].1);
    tracing::info!("[RealEstate] Browser user agent: {}", user_agent);

    format!(
        r#"Please follow these steps to set up the headless browser:

1. First, use browser_install to install the necessary browser components
2. Navigate to about:blank using browser_navigate
3. Use browser_execute_javascript to run this script that sets up all permissions:

```javascript
{}
```

4. Test that the permissions are working by navigating to a simple website like example.com
5. Let me know when the browser is ready for searches"#,
        permissions_script(user_agent, location)
    )
}

/// Prompt for a research request on `topic`
pub fn research_prompt(topic: ResearchTopic, location: Option<&str>, question: &str) -> String {
    format!(
        r#"Please use claude_research to gather information on the following real estate query:

Query: {query}

Search for recent and authoritative information on this topic.

Then answer the user's question: "{question}"

Based on the research data on {topic} for {place}, provide a well-structured response with relevant information.
Include specific data points, trends, and actionable insights, organized with headings and bullet points where appropriate."#,
        query = research_query(topic, location),
        question = question,
        topic = topic.as_str(),
        place = location.unwrap_or("the Indian market"),
    )
}

/// Prompt that walks the browser to a listing page before answering
pub fn site_search_prompt(url: &str, city: &str, question: &str, budget_hint: bool) -> String {
    let mut steps = vec![
        format!("Use browser_navigate to go to {}", url),
        format!(
            "The page may have cookie consent popups or other blocking elements. Run this JavaScript with browser_execute_javascript to bypass them:\n```javascript\n{}\n```",
            COOKIE_CONSENT_BYPASS_SCRIPT
        ),
    ];
    if let Some(location) = geolocation(city) {
        steps.push(format!(
            "Run this JavaScript to set the geolocation to {}:\n```javascript\n{}\n```",
            city,
            geolocation_script(city, location)
        ));
    }
    if budget_hint {
        steps.push("Apply the user's budget using the site's price filters".to_string());
    }
    steps.push("Use browser_snapshot to read the listings".to_string());

    let numbered: Vec<String> = steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step))
        .collect();

    format!(
        r#"{steps}

Then answer the user's question: "{question}"

Based on what you can see on the website, provide information about properties in {city}
that match their criteria. If you can't see specific properties, explain why and provide
general information about that area."#,
        steps = numbered.join("\n"),
        question = question,
        city = city,
    )
}

/// Word-level patterns for listing intent and budget mentions
#[derive(Debug)]
pub struct IntentPatterns {
    rent: Regex,
    buy: Regex,
    budget: Regex,
}

impl IntentPatterns {
    pub fn new() -> Result<Self> {
        Ok(Self {
            rent: Regex::new(r"(?i)\b(rent|rental|renting|lease)\b")?,
            buy: Regex::new(r"(?i)\b(buy|buying|purchase)\b")?,
            budget: Regex::new(
                r"(?i)\b(budget|afford|cost|price|lakhs?|lacs?|cr|crores?)\b|\d+(\.\d+)?\s*(k|l|cr)\b",
            )?,
        })
    }

    /// Rent wins when a line mentions both
    pub fn listing_mode(&self, input: &str) -> Option<ListingMode> {
        if self.rent.is_match(input) {
            Some(ListingMode::Rent)
        } else if self.buy.is_match(input) {
            Some(ListingMode::Buy)
        } else {
            None
        }
    }

    pub fn has_budget_hint(&self, input: &str) -> bool {
        self.budget.is_match(input)
    }
}

/// Rewrites user lines into research or site-search prompts
///
/// Research requests take priority. A site search needs a place in the
/// current line and a buy/rent intent from this line or an earlier one.
/// Anything else is sent unchanged.
#[derive(Debug)]
pub struct ResearchPlanner {
    patterns: IntentPatterns,
    last_mode: Mutex<Option<ListingMode>>,
}

impl ResearchPlanner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            patterns: IntentPatterns::new()?,
            last_mode: Mutex::new(None),
        })
    }

    fn remember_mode(&self, input: &str) -> Option<ListingMode> {
        let mut last = self.last_mode.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(mode) = self.patterns.listing_mode(input) {
            *last = Some(mode);
        }
        *last
    }
}

impl TurnPlanner for ResearchPlanner {
    fn plan(&self, input: &str) -> String {
        let topic = detect_research_intent(input);
        let location = detect_location(input);
        let mode = self.remember_mode(input);

        if let Some(topic) = topic {
            tracing::info!(
                "[RealEstate] Research request on {} for {}",
                topic.as_str(),
                location.unwrap_or("general market")
            );
            return research_prompt(topic, location, input);
        }

        if let (Some(city), Some(mode)) = (location, mode) {
            let site = mode.preferred_site();
            if let Some(url) = search_url(site, mode, city) {
                tracing::info!("[RealEstate] Searching {} properties in {} on {}", mode.as_str(), city, url);
                return site_search_prompt(&url, city, input, self.patterns.has_budget_hint(input));
            }
        }

        input.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_uses_city_slugs() {
        assert_eq!(
            search_url("99acres", ListingMode::Buy, "delhi").as_deref(),
            Some("https://www.99acres.com/search/property/buy/delhi-ncr-all/")
        );
        assert_eq!(
            search_url("nobroker", ListingMode::Rent, "Bangalore").as_deref(),
            Some("https://www.nobroker.in/bangalore/rent/")
        );
        assert_eq!(
            search_url("housing", ListingMode::Rent, "mumbai").as_deref(),
            Some("https://housing.com/in/mumbai/rent-property-in-mumbai")
        );
        assert_eq!(search_url("zillow", ListingMode::Buy, "mumbai"), None);
    }

    #[test]
    fn test_detect_research_intent() {
        assert_eq!(detect_research_intent("Find me a 2BHK in Pune"), None);
        assert_eq!(
            detect_research_intent("Any data on rental yield in Pune?"),
            Some(ResearchTopic::Investment)
        );
        assert_eq!(
            detect_research_intent("I need information about stamp duty"),
            Some(ResearchTopic::Legal)
        );
        assert_eq!(
            detect_research_intent("What's the outlook for Mumbai?"),
            Some(ResearchTopic::MarketTrends)
        );
        assert_eq!(
            detect_research_intent("Research on ROI for flats"),
            Some(ResearchTopic::Investment)
        );
    }

    #[test]
    fn test_detect_location_in_table_order() {
        assert_eq!(detect_location("Flats near HSR layout"), Some("hsr"));
        assert_eq!(detect_location("Mumbai or Delhi?"), Some("mumbai"));
        assert_eq!(detect_location("somewhere quiet"), None);
    }

    #[test]
    fn test_research_query_without_location() {
        assert!(research_query(ResearchTopic::Legal, None).contains("transactions in India"));
        assert!(research_query(ResearchTopic::Locations, None).starts_with("What are the fastest growing"));
        assert!(research_query(ResearchTopic::Locations, Some("pune")).contains("invest in pune"));
    }

    #[test]
    fn test_intent_patterns() {
        let patterns = IntentPatterns::new().unwrap();
        assert_eq!(patterns.listing_mode("2BHK for rent"), Some(ListingMode::Rent));
        assert_eq!(patterns.listing_mode("want to BUY a villa"), Some(ListingMode::Buy));
        assert_eq!(patterns.listing_mode("current prices"), None);
        assert!(patterns.has_budget_hint("under 80 lakh"));
        assert!(patterns.has_budget_hint("around 25k a month"));
        assert!(!patterns.has_budget_hint("a quiet park nearby"));
    }

    #[test]
    fn test_permissions_script_fills_placeholders() {
        let script = permissions_script(USER_AGENTS[0], geo(12.5, 77.25));
        assert!(script.contains(USER_AGENTS[0]));
        assert!(script.contains("latitude: 12.5"));
        assert!(script.contains("longitude: 77.25"));
        assert!(!script.contains("__"));
    }

    #[test]
    fn test_random_user_agent_is_known() {
        assert!(USER_AGENTS.contains(&random_user_agent()));
    }

    #[test]
    fn test_planner_research_takes_priority() {
        let planner = ResearchPlanner::new().unwrap();
        let prompt = planner.plan("Give me a report on home loan rates to buy in mumbai");
        assert!(prompt.contains("claude_research"));
        assert!(prompt.contains("home loan interest rates"));

        let followup = planner.plan("Show me flats in mumbai");
        assert!(followup.contains("/buy/"));
    }

    #[test]
    fn test_planner_remembers_mode_across_turns() {
        let planner = ResearchPlanner::new().unwrap();

        assert_eq!(planner.plan("I want to rent a flat"), "I want to rent a flat");

        let prompt = planner.plan("Something in bangalore under 30k");
        assert!(prompt.contains("https://www.nobroker.in/bangalore/rent/"));
        assert!(prompt.contains("Geolocation set to bangalore"));
        assert!(prompt.contains("price filters"));
        assert!(prompt.contains("\"Something in bangalore under 30k\""));
    }

    #[test]
    fn test_planner_passes_plain_lines_through() {
        let planner = ResearchPlanner::new().unwrap();
        assert_eq!(planner.plan("hello there"), "hello there");
        assert_eq!(planner.plan("what about pune?"), "what about pune?");
    }
}
