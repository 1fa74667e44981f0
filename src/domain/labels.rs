//! User-facing enums with static label tables.
//!
//! Each enum carries a stable storage key (persisted in SQLite and used in
//! config files) and a display label. Both come from one explicit table per
//! enum so the mapping is fixed at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares a fieldless enum together with its key/label table.
///
/// The first variant listed is the default.
macro_rules! labeled_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => ($key:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $key)]
                $variant
            ),+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Stable storage key.
            #[must_use]
            pub const fn key(self) -> &'static str {
                match self {
                    $(Self::$variant => $key),+
                }
            }

            /// Display label.
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            #[must_use]
            pub fn from_key(key: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|value| value.key() == key)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::ALL[0]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

pub(crate) use labeled_enum;

labeled_enum! {
    /// Color-coded purchase preference set by the user.
    pub enum Preference {
        None => ("none", "None"),
        AlwaysBuy => ("always_buy", "Always Buy"),
        UsuallyBuy => ("usually_buy", "Usually Buy"),
        SometimesBuy => ("sometimes_buy", "Sometimes Buy"),
        OnlyIfHugeSale => ("only_if_huge_sale", "Only If Huge Sale"),
        NeverBuy => ("never_buy", "Never Buy"),
    }
}

labeled_enum! {
    /// Shelf category set by the user.
    pub enum ProductCategory {
        Unknown => ("unknown", "Unknown"),
        Produce => ("produce", "Produce"),
        Bakery => ("bakery", "Bakery"),
        Bread => ("bread", "Bread"),
        MeatPoultryAndSeafood => ("meat_poultry_seafood", "Meat, Poultry & Seafood"),
        PreparedMeals => ("prepared_meals", "Prepared Meals"),
        Bacon => ("bacon", "Bacon"),
        Sausage => ("sausage", "Sausage"),
        NonCheeseDairyAndEggs => ("dairy_eggs", "Dairy & Eggs (non-cheese)"),
        Cheese => ("cheese", "Cheese"),
        SlicedCheese => ("sliced_cheese", "Sliced Cheese"),
        FridgeItems => ("fridge_items", "Fridge Items"),
        Pizza => ("pizza", "Pizza"),
        FrozenBites => ("frozen_bites", "Frozen Bites"),
        Burger => ("burgers", "Burgers"),
        PreCookedMeat => ("pre_cooked_meat", "Pre-Cooked Meat"),
        PastaRiceAndGrains => ("pasta_rice_grains", "Pasta, Rice & Grains"),
        CannedAndJarred => ("canned_jarred", "Canned & Jarred Goods"),
        BakingSupplies => ("baking_supplies", "Baking Supplies"),
        SweetSnacksAndCandies => ("sweet_snacks_candies", "Sweet Snacks & Candies"),
        BreakfastItems => ("breakfast_items", "Breakfast Items"),
        Coffee => ("coffee", "Coffee"),
        CondimentsAndSauce => ("condiments_sauces", "Condiments & Sauces"),
        SpicesAndSeasoning => ("spices_seasonings", "Spices & Seasonings"),
        OilsAndVinegars => ("oils_vinegars", "Oils & Vinegars"),
        CerealAndProteinBars => ("cereal_protein_bars", "Cereal & Protein Bars"),
        Beverages => ("beverages", "Beverages"),
        SoupsAndBroth => ("soups_broth", "Soups & Broth"),
        IceCream => ("ice_cream", "Ice Cream"),
        LightsAndLanterns => ("lights_lanterns", "Lights & Lanterns"),
        Plants => ("plants", "Plants"),
        CleaningProducts => ("cleaning_products", "Cleaning Products"),
        LaundrySupplies => ("laundry_supplies", "Laundry Supplies"),
        PaperGoods => ("paper_goods", "Paper Goods"),
        TrashAndStorage => ("trash_storage", "Trash & Storage"),
        PersonalCare => ("personal_care", "Personal Care"),
        BabyAndKidsSupplies => ("baby_kids_supplies", "Baby & Kids Supplies"),
        PetSupplies => ("pet_supplies", "Pet Supplies"),
        Medicine => ("medicine", "Medicine"),
        Vitamins => ("vitamins", "Vitamins"),
        SportsAndGym => ("sports_gym", "Sports & Gym Equipment"),
        Games => ("games", "Games"),
        StuffedAnimals => ("stuffed_animals", "Stuffed Animals"),
        Diapers => ("diapers", "Diapers"),
        LightBulbsBatteriesAndOthers => ("bulbs_batteries_misc", "Light Bulbs, Batteries & Misc."),
        HardwareAndOthers => ("hardware_misc", "Hardware & Misc."),
        BedBathAndBeyond => ("bed_bath_beyond", "Bed, Bath & Beyond"),
        KitchenUtensils => ("kitchen_utensils", "Kitchen Utensils"),
        Appliances => ("appliances", "Appliances"),
        HikingCamping => ("hiking_camping", "Hiking & Camping"),
        PhonesTablets => ("phones_tablets", "Phones & Tablets"),
        NotebooksPcsMonitor => ("notebooks_pcs_monitors", "Notebooks, PCs & Monitors"),
        SoundBars => ("sound_bars", "Sound Bars"),
        TVs => ("tvs", "TVs"),
        Jewelry => ("jewelry", "Jewelry"),
        Mattresses => ("mattresses", "Mattresses"),
        MassageEquipment => ("massage_equipment", "Massage Equipment"),
        Sunglasses => ("sunglasses", "Sunglasses"),
        WomensClothes => ("womens_clothes", "Women's Clothes"),
        KidsClothes => ("kids_clothes", "Kids' Clothes"),
        MensClothes => ("mens_clothes", "Men's Clothes"),
        CarpetsRugs => ("carpets_rugs", "Carpets & Rugs"),
        ShoesBoots => ("shoes_boots", "Shoes & Boots"),
        Furniture => ("furniture", "Furniture"),
        CarsSupplies => ("car_supplies", "Car Supplies & Others"),
        Books => ("books", "Books"),
        OutdoorAndGarden => ("outdoor_garden", "Outdoor & Garden"),
        SmartHomeAndElectronics => ("smart_home_electronics", "Smart Home & Electronics"),
        HomeDecorAndAccessories => ("home_decor_accessories", "Home Decor, Acessories & Others"),
        TravelAndAccessories => ("travel_accessories", "Travel Accessories"),
        SaltySnack => ("salty_snacks", "Salty Snacks"),
    }
}

impl ProductCategory {
    /// Categories ordered by display label, for pickers.
    #[must_use]
    pub fn sorted_by_label() -> Vec<Self> {
        let mut categories = Self::ALL.to_vec();
        categories.sort_by_key(|category| category.label());
        categories
    }
}
