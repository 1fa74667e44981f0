//! Warehouse locations whose listings are scraped independently.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use super::labels::labeled_enum;

labeled_enum! {
    /// A physical warehouse. Part of every product's composite key.
    pub enum Location {
        CalgaryBeaconHill => ("ab_calgary_beacon_hill", "Calgary, AB (Beacon Hill)"),
        Edmonton91StNw => ("ab_edmonton_91st_nw", "Edmonton, AB (91st St NW)"),
        Langley64Ave => ("bc_langley_64_ave", "Langley, BC (64th Ave)"),
        VancouverDowntown => ("bc_vancouver_downtown", "Vancouver, BC (Downtown)"),
        WinnipegMcGillivray => ("mb_winnipeg_mcgillivray", "Winnipeg, MB (McGillivray)"),
        BurlingtonBrantSt => ("on_burlington_brant_st", "Burlington, ON (Brant St)"),
        LondonWonderlandRd => ("on_london_wonderland_rd", "London, ON (Wonderland Rd)"),
        Mississauga3180LairdRd => ("on_mississauga_3180_laird_rd", "Mississauga, ON (3180 Laird Rd)"),
        OttawaGloucester => ("on_ottawa_gloucester", "Ottawa, ON (Gloucester)"),
        TorontoWardenAve => ("on_toronto_warden_ave", "Toronto, ON (Warden Ave)"),
        SaskatoonSouth => ("sk_saskatoon_south", "Saskatoon, SK (South)"),
    }
}

impl Location {
    /// Path segment of this location's listing page on the deals site.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::CalgaryBeaconHill => "ca-ab-calgary-nw-beacon-hill-25",
            Self::Edmonton91StNw => "ca-ab-edmonton-s-91-st-nw-28",
            Self::Langley64Ave => "ca-bc-langley--20499-64-ave-34",
            Self::VancouverDowntown => "ca-bc-vancouver--vancouver-downtown-33",
            Self::WinnipegMcGillivray => "ca-mb-winnipeg-sw-mcgillivray-27",
            Self::BurlingtonBrantSt => "ca-on-burlington--brant-st-30",
            Self::LondonWonderlandRd => "ca-on-london-n-693-wonderland-rd-29",
            Self::Mississauga3180LairdRd => "ca-on-mississauga-&-oakville-s-3180-laird-rd-23",
            Self::OttawaGloucester => "ca-on-ottawa-ne-gloucester-35",
            Self::TorontoWardenAve => "ca-on-toronto--warden-ave-31",
            Self::SaskatoonSouth => "ca-sk-saskatoon-s-south-19",
        }
    }

    /// Resolves a run parameter to a location.
    ///
    /// Accepts a storage key or a display label (case-insensitive). Missing or
    /// unrecognized input selects the first location.
    #[must_use]
    pub fn parse_or_default(input: Option<&str>) -> Self {
        let Some(raw) = input.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::default();
        };

        Self::ALL
            .iter()
            .copied()
            .find(|location| {
                location.key().eq_ignore_ascii_case(raw) || location.label().eq_ignore_ascii_case(raw)
            })
            .unwrap_or_else(|| {
                warn!("Unrecognized location '{}', falling back to {}", raw, Self::default());
                Self::default()
            })
    }
}
