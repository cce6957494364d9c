//! The cities the seeder searches for, per coast.

use coast_engine::Coast;

/// A city to collect photos of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityTarget {
    /// The coast the city is played as.
    pub coast: Coast,
    /// Used in ids and file names, e.g. `san-francisco`.
    pub slug: &'static str,
    /// Display name stored in the manifest.
    pub name: &'static str,
    /// Queries tried in order until the city is full.
    pub search_terms: &'static [&'static str],
}

impl CityTarget {
    /// Prefix shared by every image id of this city, e.g. `west-seattle-`.
    pub fn id_prefix(&self) -> String {
        format!("{}-{}-", self.coast, self.slug)
    }
}

const fn city(
    coast: Coast,
    slug: &'static str,
    name: &'static str,
    search_terms: &'static [&'static str],
) -> CityTarget {
    CityTarget {
        coast,
        slug,
        name,
        search_terms,
    }
}

/// The built-in catalog: west coast cities first, then east.
pub fn default_catalog() -> Vec<CityTarget> {
    use Coast::{East, West};

    vec![
        city(
            West,
            "seattle",
            "Seattle",
            &[
                "seattle downtown skyline",
                "seattle cityscape buildings",
                "seattle financial district",
                "seattle urban architecture",
                "seattle city aerial",
            ],
        ),
        city(
            West,
            "portland",
            "Portland",
            &[
                "portland oregon downtown skyline",
                "portland cityscape",
                "portland urban buildings",
                "portland city aerial",
            ],
        ),
        city(
            West,
            "san-francisco",
            "San Francisco",
            &[
                "san francisco downtown skyline",
                "san francisco financial district",
                "san francisco cityscape",
                "san francisco urban buildings",
                "san francisco embarcadero",
            ],
        ),
        city(
            West,
            "los-angeles",
            "Los Angeles",
            &[
                "los angeles downtown skyline",
                "la cityscape buildings",
                "los angeles financial district",
                "dtla urban architecture",
                "los angeles city aerial",
            ],
        ),
        city(
            West,
            "san-diego",
            "San Diego",
            &[
                "san diego downtown skyline",
                "san diego cityscape",
                "san diego gaslamp district",
                "san diego urban buildings",
            ],
        ),
        city(
            West,
            "sacramento",
            "Sacramento",
            &[
                "sacramento california downtown",
                "sacramento skyline",
                "sacramento cityscape",
            ],
        ),
        city(
            West,
            "oakland",
            "Oakland",
            &[
                "oakland california downtown",
                "oakland skyline",
                "oakland cityscape buildings",
            ],
        ),
        city(
            West,
            "phoenix",
            "Phoenix",
            &[
                "phoenix arizona downtown skyline",
                "phoenix cityscape",
                "phoenix urban buildings",
                "phoenix financial district",
            ],
        ),
        city(
            West,
            "denver",
            "Denver",
            &[
                "denver colorado downtown skyline",
                "denver cityscape",
                "denver urban buildings",
                "denver financial district",
            ],
        ),
        city(
            West,
            "las-vegas",
            "Las Vegas",
            &[
                "las vegas strip skyline",
                "las vegas downtown cityscape",
                "las vegas urban buildings",
            ],
        ),
        city(
            East,
            "new-york",
            "New York",
            &[
                "new york city manhattan skyline",
                "nyc downtown financial district",
                "manhattan cityscape",
                "new york urban architecture",
                "nyc midtown buildings",
                "new york city aerial",
            ],
        ),
        city(
            East,
            "boston",
            "Boston",
            &[
                "boston downtown skyline",
                "boston cityscape",
                "boston financial district",
                "boston urban buildings",
            ],
        ),
        city(
            East,
            "philadelphia",
            "Philadelphia",
            &[
                "philadelphia downtown skyline",
                "philadelphia cityscape",
                "philly urban buildings",
                "philadelphia center city",
            ],
        ),
        city(
            East,
            "miami",
            "Miami",
            &[
                "miami downtown skyline",
                "miami brickell cityscape",
                "miami urban buildings",
                "miami financial district",
                "miami city aerial",
            ],
        ),
        city(
            East,
            "washington-dc",
            "Washington D.C.",
            &[
                "washington dc downtown",
                "dc cityscape buildings",
                "washington dc urban architecture",
            ],
        ),
        city(
            East,
            "baltimore",
            "Baltimore",
            &[
                "baltimore downtown skyline",
                "baltimore inner harbor cityscape",
                "baltimore urban buildings",
            ],
        ),
        city(
            East,
            "atlanta",
            "Atlanta",
            &[
                "atlanta downtown skyline",
                "atlanta cityscape",
                "atlanta midtown buildings",
                "atlanta urban architecture",
            ],
        ),
        city(
            East,
            "charlotte",
            "Charlotte",
            &[
                "charlotte north carolina downtown skyline",
                "charlotte cityscape",
                "charlotte uptown buildings",
            ],
        ),
        city(
            East,
            "chicago",
            "Chicago",
            &[
                "chicago downtown skyline",
                "chicago loop cityscape",
                "chicago urban architecture",
                "chicago michigan avenue",
                "chicago city aerial",
            ],
        ),
        city(
            East,
            "pittsburgh",
            "Pittsburgh",
            &[
                "pittsburgh downtown skyline",
                "pittsburgh cityscape",
                "pittsburgh golden triangle",
            ],
        ),
        city(
            East,
            "detroit",
            "Detroit",
            &[
                "detroit downtown skyline",
                "detroit cityscape",
                "detroit urban buildings",
            ],
        ),
    ]
}
