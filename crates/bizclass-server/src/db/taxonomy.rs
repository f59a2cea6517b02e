// db/taxonomy.rs
// Taxonomy lookups: keywords, topics, co-occurrence patterns, codes, crosswalks
//
// Every function takes a plain &Connection and runs inside pool.run(), so the
// batched lookups cost one round trip each.

use bizclass_types::CodeType;
use rusqlite::{Connection, ToSql, params};

/// Upper bound on bound parameters per batched query
const MAX_BATCH: usize = 8_000;

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordRow {
    pub keyword: String,
    pub industry: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicRow {
    pub topic: String,
    pub industry: String,
    pub relevance: f64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternRow {
    pub keyword: String,
    pub entity: String,
    pub industry: String,
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeRow {
    pub code_type: CodeType,
    pub code: String,
    pub description: Option<String>,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrosswalkRow {
    pub from_type: CodeType,
    pub from_code: String,
    pub to_type: CodeType,
    pub to_code: String,
    pub description: Option<String>,
    pub confidence: f64,
}

fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_code_type(value: String) -> rusqlite::Result<CodeType> {
    CodeType::parse(&value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("unknown code type '{}'", value).into(),
        )
    })
}

/// Exact keyword matches plus multi-word phrases contained in `phrase_text`.
///
/// `phrase_text` is the normalized request text padded with single spaces so
/// phrases only match on word boundaries.
pub fn match_keywords_sync(
    conn: &Connection,
    keywords: &[String],
    phrase_text: &str,
) -> rusqlite::Result<Vec<KeywordRow>> {
    let capped = &keywords[..keywords.len().min(MAX_BATCH)];
    let in_clause = if capped.is_empty() {
        "NULL".to_string()
    } else {
        placeholders(2, capped.len())
    };
    let sql = format!(
        "SELECT k.keyword, i.name, k.weight
         FROM industry_keywords k
         JOIN industries i ON i.id = k.industry_id
         WHERE k.keyword IN ({})
            OR (instr(k.keyword, ' ') > 0 AND instr(?1, ' ' || k.keyword || ' ') > 0)
         ORDER BY i.name, k.keyword",
        in_clause
    );

    let mut params: Vec<&dyn ToSql> = Vec::with_capacity(capped.len() + 1);
    params.push(&phrase_text);
    for keyword in capped {
        params.push(keyword);
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params), |row| {
        Ok(KeywordRow {
            keyword: row.get(0)?,
            industry: row.get(1)?,
            weight: row.get(2)?,
        })
    })?;
    rows.collect()
}

/// Every keyword row, used to build the trigram index
pub fn all_keywords_sync(conn: &Connection) -> rusqlite::Result<Vec<KeywordRow>> {
    let mut stmt = conn.prepare(
        "SELECT k.keyword, i.name, k.weight
         FROM industry_keywords k
         JOIN industries i ON i.id = k.industry_id
         ORDER BY k.id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(KeywordRow {
            keyword: row.get(0)?,
            industry: row.get(1)?,
            weight: row.get(2)?,
        })
    })?;
    rows.collect()
}

/// Every topic mapping with its calibration weight
pub fn all_topics_sync(conn: &Connection) -> rusqlite::Result<Vec<TopicRow>> {
    let mut stmt = conn.prepare(
        "SELECT t.topic, i.name, t.relevance, t.accuracy
         FROM industry_topics t
         JOIN industries i ON i.id = t.industry_id
         ORDER BY t.topic, i.name",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(TopicRow {
            topic: row.get(0)?,
            industry: row.get(1)?,
            relevance: row.get(2)?,
            accuracy: row.get(3)?,
        })
    })?;
    rows.collect()
}

/// Look up all (keyword, entity) pairs in one query via a VALUES table.
pub fn match_patterns_sync(
    conn: &Connection,
    pairs: &[(String, String)],
) -> rusqlite::Result<Vec<PatternRow>> {
    let capped = &pairs[..pairs.len().min(MAX_BATCH / 2)];
    if capped.is_empty() {
        return Ok(Vec::new());
    }

    let values = (0..capped.len())
        .map(|i| format!("(?{}, ?{})", i * 2 + 1, i * 2 + 2))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "WITH pairs(keyword, entity) AS (VALUES {})
         SELECT kp.keyword, kp.entity, i.name, kp.strength
         FROM pairs p
         JOIN keyword_patterns kp ON kp.keyword = p.keyword AND kp.entity = p.entity
         JOIN industries i ON i.id = kp.industry_id
         ORDER BY i.name, kp.keyword, kp.entity",
        values
    );

    let mut params: Vec<&dyn ToSql> = Vec::with_capacity(capped.len() * 2);
    for (keyword, entity) in capped {
        params.push(keyword);
        params.push(entity);
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params), |row| {
        Ok(PatternRow {
            keyword: row.get(0)?,
            entity: row.get(1)?,
            industry: row.get(2)?,
            strength: row.get(3)?,
        })
    })?;
    rows.collect()
}

/// Codes directly associated with an industry, most relevant first
pub fn codes_for_industry_sync(
    conn: &Connection,
    industry: &str,
    code_type: CodeType,
    limit: usize,
) -> rusqlite::Result<Vec<CodeRow>> {
    let mut stmt = conn.prepare(
        "SELECT ic.code, c.description, ic.relevance
         FROM industry_codes ic
         JOIN industries i ON i.id = ic.industry_id
         LEFT JOIN classification_codes c ON c.code_type = ic.code_type AND c.code = ic.code
         WHERE i.name = ?1 AND ic.code_type = ?2
         ORDER BY ic.relevance DESC, ic.code
         LIMIT ?3",
    )?;
    let rows = stmt.query_map(params![industry, code_type.as_str(), limit as i64], |row| {
        Ok(CodeRow {
            code_type,
            code: row.get(0)?,
            description: row.get(1)?,
            weight: row.get(2)?,
        })
    })?;
    rows.collect()
}

/// Codes whose keyword list intersects the request keywords or phrases
pub fn codes_for_keywords_sync(
    conn: &Connection,
    keywords: &[String],
    phrase_text: &str,
    code_type: CodeType,
    limit: usize,
) -> rusqlite::Result<Vec<CodeRow>> {
    let capped = &keywords[..keywords.len().min(MAX_BATCH)];
    let in_clause = if capped.is_empty() {
        "NULL".to_string()
    } else {
        placeholders(4, capped.len())
    };
    let sql = format!(
        "SELECT ck.code, c.description, MAX(ck.weight) AS w
         FROM code_keywords ck
         LEFT JOIN classification_codes c ON c.code_type = ck.code_type AND c.code = ck.code
         WHERE ck.code_type = ?1
           AND (ck.keyword IN ({})
                OR (instr(ck.keyword, ' ') > 0 AND instr(?2, ' ' || ck.keyword || ' ') > 0))
         GROUP BY ck.code
         ORDER BY w DESC, ck.code
         LIMIT ?3",
        in_clause
    );

    let type_str = code_type.as_str();
    let limit = limit as i64;
    let mut params: Vec<&dyn ToSql> = Vec::with_capacity(capped.len() + 3);
    params.push(&type_str);
    params.push(&phrase_text);
    params.push(&limit);
    for keyword in capped {
        params.push(keyword);
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params), |row| {
        Ok(CodeRow {
            code_type,
            code: row.get(0)?,
            description: row.get(1)?,
            weight: row.get(2)?,
        })
    })?;
    rows.collect()
}

/// Map codes under other schemes to equivalents under `to`.
pub fn crosswalk_sync(
    conn: &Connection,
    from: &[(CodeType, String)],
    to: CodeType,
) -> rusqlite::Result<Vec<CrosswalkRow>> {
    let capped = &from[..from.len().min(MAX_BATCH / 2)];
    if capped.is_empty() {
        return Ok(Vec::new());
    }

    let values = (0..capped.len())
        .map(|i| format!("(?{}, ?{})", i * 2 + 2, i * 2 + 3))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "WITH src(from_type, from_code) AS (VALUES {})
         SELECT x.from_type, x.from_code, x.to_type, x.to_code, c.description, x.confidence
         FROM src s
         JOIN code_crosswalks x ON x.from_type = s.from_type AND x.from_code = s.from_code
         LEFT JOIN classification_codes c ON c.code_type = x.to_type AND c.code = x.to_code
         WHERE x.to_type = ?1
         ORDER BY x.confidence DESC, x.to_code",
        values
    );

    let to_str = to.as_str();
    let type_strs: Vec<&'static str> = capped.iter().map(|(t, _)| t.as_str()).collect();
    let mut params: Vec<&dyn ToSql> = Vec::with_capacity(capped.len() * 2 + 1);
    params.push(&to_str);
    for ((_, code), type_str) in capped.iter().zip(type_strs.iter()) {
        params.push(type_str);
        params.push(code);
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params), |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, f64>(5)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (from_type, from_code, to_type, to_code, description, confidence) = row?;
        out.push(CrosswalkRow {
            from_type: parse_code_type(from_type)?,
            from_code,
            to_type: parse_code_type(to_type)?,
            to_code,
            description,
            confidence,
        });
    }
    Ok(out)
}
