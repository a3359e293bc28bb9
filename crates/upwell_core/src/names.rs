//! Placeholder names for drafts created without a message.

use rand::seq::SliceRandom;

const DESSERTS: &[&str] = &[
    "Apple Crumble",
    "Baklava",
    "Banoffee Pie",
    "Black Forest Cake",
    "Blondie",
    "Bread Pudding",
    "Brownie",
    "Cannoli",
    "Carrot Cake",
    "Cheesecake",
    "Churros",
    "Clafoutis",
    "Creme Brulee",
    "Eclair",
    "Eton Mess",
    "Flan",
    "Gelato",
    "Key Lime Pie",
    "Lemon Tart",
    "Macaron",
    "Madeleine",
    "Mochi",
    "Panna Cotta",
    "Pavlova",
    "Pecan Pie",
    "Profiterole",
    "Rice Pudding",
    "Sachertorte",
    "Sticky Toffee Pudding",
    "Strudel",
    "Tarte Tatin",
    "Tiramisu",
    "Trifle",
];

/// Pick a random dessert name.
pub fn random_dessert() -> String {
    DESSERTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Pudding")
        .to_string()
}
