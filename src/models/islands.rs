// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Islands served and their municipalities.

const GRAN_CANARIA: &[&str] = &[
    "Agaete",
    "Agüimes",
    "Artenara",
    "Arucas",
    "Firgas",
    "Gáldar",
    "Ingenio",
    "La Aldea de San Nicolás",
    "Las Palmas de Gran Canaria",
    "Mogán",
    "Moya",
    "San Bartolomé de Tirajana",
    "Santa Brígida",
    "Santa Lucía de Tirajana",
    "Santa María de Guía de Gran Canaria",
    "Tejeda",
    "Telde",
    "Teror",
    "Valleseco",
    "Valsequillo",
    "Vega de San Mateo",
];

const TENERIFE: &[&str] = &[
    "Adeje",
    "Arafo",
    "Arico",
    "Arona",
    "Buenavista del Norte",
    "Candelaria",
    "El Rosario",
    "El Sauzal",
    "El Tanque",
    "Fasnia",
    "Garachico",
    "Granadilla de Abona",
    "Guía de Isora",
    "Güímar",
    "Icod de los Vinos",
    "La Guancha",
    "La Matanza de Acentejo",
    "La Orotava",
    "La Victoria de Acentejo",
    "Los Realejos",
    "Los Silos",
    "Puerto de la Cruz",
    "San Cristóbal de La Laguna",
    "San Juan de la Rambla",
    "San Miguel de Abona",
    "Santa Cruz de Tenerife",
    "Santa Úrsula",
    "Santiago del Teide",
    "Tacoronte",
    "Tegueste",
    "Vilaflor de Chasna",
];

const FUERTEVENTURA: &[&str] = &[
    "Antigua",
    "Betancuria",
    "La Oliva",
    "Pájara",
    "Puerto del Rosario",
    "Tuineje",
];

const LANZAROTE: &[&str] = &[
    "Arrecife",
    "Haría",
    "San Bartolomé",
    "Teguise",
    "Tías",
    "Tinajo",
    "Yaiza",
];

/// Island names in display order.
pub const ISLANDS: &[&str] = &["Gran Canaria", "Tenerife", "Fuerteventura", "Lanzarote"];

/// Municipalities of an island, or `None` for an island we don't serve.
pub fn municipalities(island: &str) -> Option<&'static [&'static str]> {
    match island {
        "Gran Canaria" => Some(GRAN_CANARIA),
        "Tenerife" => Some(TENERIFE),
        "Fuerteventura" => Some(FUERTEVENTURA),
        "Lanzarote" => Some(LANZAROTE),
        _ => None,
    }
}

/// Whether `municipality` belongs to `island`.
pub fn is_valid_municipality(island: &str, municipality: &str) -> bool {
    municipalities(island).is_some_and(|list| list.contains(&municipality))
}
