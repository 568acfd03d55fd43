//! Wire shapes of the catalog API and their validation into core types

use serde::Deserialize;

use crate::error::{CatalogError, Result};
use crate::types::{Entity, EntityTrait, NameDirectoryEntry, Stat};

#[derive(Debug, Deserialize)]
pub(crate) struct RawEntity {
    id: u32,
    name: String,
    #[serde(default)]
    sprites: Option<RawSprites>,
    types: Vec<RawTypeSlot>,
    #[serde(default)]
    stats: Vec<RawStat>,
    #[serde(default)]
    abilities: Vec<RawAbility>,
    height: u32,
    weight: u32,
}

#[derive(Debug, Default, Deserialize)]
struct RawSprites {
    #[serde(default)]
    other: Option<RawOtherSprites>,
}

#[derive(Debug, Default, Deserialize)]
struct RawOtherSprites {
    #[serde(rename = "official-artwork", default)]
    official_artwork: Option<RawArtwork>,
}

#[derive(Debug, Default, Deserialize)]
struct RawArtwork {
    #[serde(default)]
    front_default: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedResource {
    name: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct RawTypeSlot {
    #[serde(rename = "type")]
    kind: NamedResource,
}

#[derive(Debug, Deserialize)]
struct RawStat {
    base_stat: u32,
    stat: NamedResource,
}

#[derive(Debug, Deserialize)]
struct RawAbility {
    ability: NamedResource,
    #[serde(default)]
    is_hidden: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawDirectory {
    results: Vec<NamedResource>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCategory {
    pokemon: Vec<RawCategoryMember>,
}

#[derive(Debug, Deserialize)]
struct RawCategoryMember {
    pokemon: NamedResource,
}

impl TryFrom<RawEntity> for Entity {
    type Error = CatalogError;

    fn try_from(raw: RawEntity) -> Result<Self> {
        if raw.id == 0 {
            return Err(CatalogError::Parse("entity id must be positive".into()));
        }
        if raw.name.trim().is_empty() {
            return Err(CatalogError::Parse(format!("entity {} has no name", raw.id)));
        }

        let sprite_url = raw
            .sprites
            .and_then(|s| s.other)
            .and_then(|o| o.official_artwork)
            .and_then(|a| a.front_default)
            .unwrap_or_default();

        Ok(Entity {
            id: raw.id,
            name: raw.name,
            sprite_url,
            categories: raw.types.into_iter().map(|t| t.kind.name).collect(),
            stats: raw
                .stats
                .into_iter()
                .map(|s| Stat {
                    name: s.stat.name,
                    value: s.base_stat,
                })
                .collect(),
            traits: raw
                .abilities
                .into_iter()
                .map(|a| EntityTrait {
                    name: a.ability.name,
                    hidden: a.is_hidden,
                })
                .collect(),
            height: raw.height,
            weight: raw.weight,
        })
    }
}

impl RawDirectory {
    pub(crate) fn into_entries(self) -> Result<Vec<NameDirectoryEntry>> {
        self.results
            .into_iter()
            .map(|item| {
                let id = id_from_resource_url(&item.url).ok_or_else(|| {
                    CatalogError::Parse(format!("no id in directory url '{}'", item.url))
                })?;
                Ok(NameDirectoryEntry { id, name: item.name })
            })
            .collect()
    }
}

impl RawCategory {
    pub(crate) fn into_ids(self) -> Result<Vec<u32>> {
        self.pokemon
            .into_iter()
            .map(|member| {
                id_from_resource_url(&member.pokemon.url).ok_or_else(|| {
                    CatalogError::Parse(format!(
                        "no id in category member url '{}'",
                        member.pokemon.url
                    ))
                })
            })
            .collect()
    }
}

/// Decode a JSON body, reporting malformed payloads as [`CatalogError::Parse`]
pub(crate) fn decode<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| CatalogError::Parse(e.to_string()))
}

/// Extract the numeric id from a resource url such as
/// `https://pokeapi.co/api/v2/pokemon/25/`
pub(crate) fn id_from_resource_url(url: &str) -> Option<u32> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse::<u32>().ok())
        .filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_resource_url() {
        assert_eq!(id_from_resource_url("https://pokeapi.co/api/v2/pokemon/25/"), Some(25));
        assert_eq!(id_from_resource_url("https://pokeapi.co/api/v2/pokemon/6"), Some(6));
        assert_eq!(id_from_resource_url("https://pokeapi.co/api/v2/pokemon/"), None);
        assert_eq!(id_from_resource_url(""), None);
    }

    #[test]
    fn test_decode_entity() {
        let body = r#"{
            "id": 6,
            "name": "charizard",
            "sprites": {"other": {"official-artwork": {"front_default": "https://img/6.png"}}},
            "types": [
                {"slot": 1, "type": {"name": "fire", "url": "https://pokeapi.co/api/v2/type/10/"}},
                {"slot": 2, "type": {"name": "flying", "url": "https://pokeapi.co/api/v2/type/3/"}}
            ],
            "stats": [{"base_stat": 78, "effort": 0, "stat": {"name": "hp", "url": ""}}],
            "abilities": [
                {"ability": {"name": "blaze", "url": ""}, "is_hidden": false, "slot": 1},
                {"ability": {"name": "solar-power", "url": ""}, "is_hidden": true, "slot": 3}
            ],
            "height": 17,
            "weight": 905,
            "base_experience": 267
        }"#;

        let raw: RawEntity = decode(body).unwrap();
        let entity = Entity::try_from(raw).unwrap();

        assert_eq!(entity.id, 6);
        assert_eq!(entity.sprite_url, "https://img/6.png");
        assert_eq!(entity.categories, vec!["fire", "flying"]);
        assert_eq!(entity.stats[0], Stat { name: "hp".into(), value: 78 });
        assert!(entity.traits[1].hidden);
        assert_eq!(entity.weight, 905);
    }

    #[test]
    fn test_missing_artwork_is_empty_sprite() {
        let body = r#"{"id": 1, "name": "bulbasaur", "sprites": {"other": {}},
            "types": [], "height": 7, "weight": 69}"#;
        let entity = Entity::try_from(decode::<RawEntity>(body).unwrap()).unwrap();
        assert_eq!(entity.sprite_url, "");
        assert!(entity.stats.is_empty());
    }

    #[test]
    fn test_malformed_entity_is_parse_error() {
        let err = decode::<RawEntity>(r#"{"id": "six"}"#).unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));

        let raw: RawEntity =
            decode(r#"{"id": 3, "name": " ", "types": [], "height": 1, "weight": 1}"#).unwrap();
        assert!(matches!(Entity::try_from(raw), Err(CatalogError::Parse(_))));
    }

    #[test]
    fn test_category_ids() {
        let body = r#"{"pokemon": [
            {"pokemon": {"name": "charizard", "url": "https://pokeapi.co/api/v2/pokemon/6/"}},
            {"pokemon": {"name": "pidgey", "url": "https://pokeapi.co/api/v2/pokemon/16/"}}
        ]}"#;
        let ids = decode::<RawCategory>(body).unwrap().into_ids().unwrap();
        assert_eq!(ids, vec![6, 16]);
    }
}
