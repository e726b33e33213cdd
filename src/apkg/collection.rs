//! Layout of `collection.anki2`: the SQLite schema (version 11) and the JSON
//! blobs stored in the single `col` row.

use serde_json::{json, Map, Value};

use super::models::{Deck, Model};

pub const SCHEMA_VERSION: i64 = 11;

/// Id of the deck every Anki collection carries
pub const DEFAULT_DECK_ID: i64 = 1;

pub const SCHEMA: &str = r#"
CREATE TABLE col (
    id              integer primary key,
    crt             integer not null,
    mod             integer not null,
    scm             integer not null,
    ver             integer not null,
    dty             integer not null,
    usn             integer not null,
    ls              integer not null,
    conf            text not null,
    models          text not null,
    decks           text not null,
    dconf           text not null,
    tags            text not null
);
CREATE TABLE notes (
    id              integer primary key,
    guid            text not null,
    mid             integer not null,
    mod             integer not null,
    usn             integer not null,
    tags            text not null,
    flds            text not null,
    sfld            integer not null,
    csum            integer not null,
    flags           integer not null,
    data            text not null
);
CREATE TABLE cards (
    id              integer primary key,
    nid             integer not null,
    did             integer not null,
    ord             integer not null,
    mod             integer not null,
    usn             integer not null,
    type            integer not null,
    queue           integer not null,
    due             integer not null,
    ivl             integer not null,
    factor          integer not null,
    reps            integer not null,
    lapses          integer not null,
    left            integer not null,
    odue            integer not null,
    odid            integer not null,
    flags           integer not null,
    data            text not null
);
CREATE TABLE revlog (
    id              integer primary key,
    cid             integer not null,
    usn             integer not null,
    time            integer not null,
    ease            integer not null,
    ivl             integer not null,
    lastIvl         integer not null,
    factor          integer not null,
    type            integer not null
);
CREATE TABLE graves (
    usn             integer not null,
    oid             integer not null,
    type            integer not null
);
CREATE INDEX ix_notes_usn on notes (usn);
CREATE INDEX ix_cards_usn on cards (usn);
CREATE INDEX ix_revlog_usn on revlog (usn);
CREATE INDEX ix_cards_nid on cards (nid);
CREATE INDEX ix_cards_sched on cards (did, queue, due);
CREATE INDEX ix_revlog_cid on revlog (cid);
CREATE INDEX ix_notes_csum on notes (csum);
"#;

const LATEX_PRE: &str = "\\documentclass[12pt]{article}\n\\special{papersize=3in,5in}\n\\usepackage[utf8]{inputenc}\n\\usepackage{amssymb,amsmath}\n\\pagestyle{empty}\n\\setlength{\\parindent}{0in}\n\\begin{document}\n";

const LATEX_POST: &str = "\\end{document}";

/// `col.conf`: collection-wide preferences
pub fn collection_config(current_model: i64) -> Value {
    json!({
        "activeDecks": [DEFAULT_DECK_ID],
        "addToCur": true,
        "collapseTime": 1200,
        "curDeck": DEFAULT_DECK_ID,
        "curModel": current_model.to_string(),
        "dueCounts": true,
        "estTimes": true,
        "newBury": true,
        "newSpread": 0,
        "nextPos": 1,
        "sortBackwards": false,
        "sortType": "noteFld",
        "timeLim": 0
    })
}

fn model_json(model: &Model, deck_id: i64, modified: i64) -> Value {
    let fields: Vec<Value> = model
        .fields
        .iter()
        .enumerate()
        .map(|(ord, field)| {
            json!({
                "name": field.name,
                "font": "Arial",
                "media": [],
                "ord": ord,
                "rtl": false,
                "size": 20,
                "sticky": false
            })
        })
        .collect();

    let templates: Vec<Value> = model
        .templates
        .iter()
        .enumerate()
        .map(|(ord, template)| {
            json!({
                "name": template.name,
                "qfmt": template.qfmt,
                "afmt": template.afmt,
                "bqfmt": "",
                "bafmt": "",
                "did": null,
                "ord": ord
            })
        })
        .collect();

    let req: Vec<Value> = model
        .requirements()
        .iter()
        .map(|r| json!([r.ord, r.kind.as_str(), r.fields]))
        .collect();

    json!({
        "id": model.id.to_string(),
        "name": model.name,
        "type": 0,
        "did": deck_id,
        "mod": modified,
        "usn": -1,
        "sortf": model.sort_field,
        "flds": fields,
        "tmpls": templates,
        "req": req,
        "css": model.css,
        "latexPre": LATEX_PRE,
        "latexPost": LATEX_POST,
        "latexsvg": false,
        "tags": [],
        "vers": []
    })
}

/// `col.models`: note types keyed by id
pub fn models_json(decks: &[Deck], modified: i64) -> Value {
    let mut models = Map::new();
    for deck in decks {
        for model in deck.models() {
            let key = model.id.to_string();
            if !models.contains_key(&key) {
                models.insert(key, model_json(&model, deck.id, modified));
            }
        }
    }
    Value::Object(models)
}

fn deck_json(id: i64, name: &str, description: &str, modified: i64) -> Value {
    json!({
        "id": id,
        "name": name,
        "desc": description,
        "mod": modified,
        "usn": -1,
        "collapsed": false,
        "browserCollapsed": false,
        "conf": 1,
        "dyn": 0,
        "extendNew": 0,
        "extendRev": 50,
        "newToday": [0, 0],
        "revToday": [0, 0],
        "lrnToday": [0, 0],
        "timeToday": [0, 0]
    })
}

/// `col.decks`: the Default deck plus every deck in the package
pub fn decks_json(decks: &[Deck], modified: i64) -> Value {
    let mut map = Map::new();
    map.insert(
        DEFAULT_DECK_ID.to_string(),
        deck_json(DEFAULT_DECK_ID, "Default", "", modified),
    );
    for deck in decks {
        map.insert(
            deck.id.to_string(),
            deck_json(deck.id, &deck.name, &deck.description, modified),
        );
    }
    Value::Object(map)
}

/// `col.dconf`: the default deck options group
pub fn deck_options_json() -> Value {
    json!({
        "1": {
            "id": 1,
            "name": "Default",
            "mod": 0,
            "usn": 0,
            "maxTaken": 60,
            "autoplay": true,
            "replayq": true,
            "timer": 0,
            "dyn": false,
            "new": {
                "bury": true,
                "delays": [1.0, 10.0],
                "initialFactor": 2500,
                "ints": [1, 4, 7],
                "order": 1,
                "perDay": 20,
                "separate": true
            },
            "lapse": {
                "delays": [10.0],
                "leechAction": 0,
                "leechFails": 8,
                "minInt": 1,
                "mult": 0.0
            },
            "rev": {
                "bury": true,
                "ease4": 1.3,
                "fuzz": 0.05,
                "ivlFct": 1.0,
                "maxIvl": 36500,
                "minSpace": 1,
                "perDay": 100
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::apkg::models::Note;
    use crate::config::ModelConfig;

    fn deck_with_note() -> Deck {
        let model = Arc::new(Model::question_answer(&ModelConfig::default()));
        let mut deck = Deck::new(2059400110, "Animals");
        deck.add_note(Note::new(&model, vec!["Cat".into(), "Katze".into()]).unwrap());
        deck
    }

    #[test]
    fn test_models_json_shape() {
        let decks = vec![deck_with_note()];
        let models = models_json(&decks, 1_700_000_000);

        let model = &models["1607392319"];
        assert_eq!(model["name"], "Simple Model");
        assert_eq!(model["did"], 2059400110);
        assert_eq!(model["flds"][0]["name"], "Question");
        assert_eq!(model["flds"][1]["ord"], 1);
        assert_eq!(model["tmpls"][0]["qfmt"], "{{Question}}");
        assert_eq!(model["req"], json!([[0, "all", [0]]]));
    }

    #[test]
    fn test_decks_json_includes_default() {
        let decks = vec![deck_with_note()];
        let json = decks_json(&decks, 0);

        assert_eq!(json["1"]["name"], "Default");
        assert_eq!(json["2059400110"]["name"], "Animals");
        assert_eq!(json["2059400110"]["conf"], 1);
    }

    #[test]
    fn test_collection_config_points_at_model() {
        let conf = collection_config(1607392319);
        assert_eq!(conf["curModel"], "1607392319");
        assert_eq!(conf["curDeck"], 1);
    }
}
