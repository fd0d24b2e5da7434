//! The conversation-style annotation file format.
//!
//! Each sample is `{"image": ..., "conversations": [question, answer]}` where
//! the answer text is itself JSON: a single region object or an array of them.

use crate::{common::*, AnnotationRecord, Layout, Region};

pub const HUMAN: &str = "human";
pub const GPT: &str = "gpt";

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub from: String,
    pub value: String,
}

impl Turn {
    pub fn human(value: impl Into<String>) -> Self {
        Self {
            from: HUMAN.into(),
            value: value.into(),
        }
    }

    pub fn gpt(value: impl Into<String>) -> Self {
        Self {
            from: GPT.into(),
            value: value.into(),
        }
    }
}

/// One example as stored in an annotation file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub image: String,
    pub conversations: Vec<Turn>,
}

impl Sample {
    /// Decodes the answer turn into a record whose regions are in `system` units.
    pub fn to_record(&self, system: CoordinateSystem) -> Result<AnnotationRecord> {
        let [question, answer] = match self.conversations.as_slice() {
            [question, answer] => [question, answer],
            turns => {
                return Err(Error::malformed_sample(format!(
                    "'{}' has {} turns, expect a question and an answer",
                    self.image,
                    turns.len()
                )))
            }
        };

        let value: Value = serde_json::from_str(&answer.value).map_err(|err| {
            Error::malformed_sample(format!(
                "answer of '{}' is not valid JSON: {}",
                self.image, err
            ))
        })?;
        let (regions, layout) = match &value {
            Value::Array(items) => {
                let regions = items
                    .iter()
                    .map(|item| Region::from_json(item, system))
                    .collect::<Result<Vec<_>>>()?;
                (regions, Layout::List)
            }
            Value::Object(_) => (vec![Region::from_json(&value, system)?], Layout::Single),
            other => {
                return Err(Error::malformed_sample(format!(
                    "answer of '{}' must be an object or an array, got {}",
                    self.image, other
                )))
            }
        };

        Ok(AnnotationRecord {
            image: self.image.clone(),
            prompt: Some(question.value.clone()),
            regions,
            layout,
        })
    }

    /// Encodes a record, refusing records that mix coordinate systems or hold degenerate boxes.
    pub fn from_record(record: &AnnotationRecord) -> Result<Self> {
        record.validate()?;

        let answer = match (record.layout, record.regions.as_slice()) {
            (Layout::Single, [region]) => region.to_json(),
            (_, regions) => Value::Array(regions.iter().map(Region::to_json).collect()),
        };

        Ok(Self {
            image: record.image.clone(),
            conversations: vec![
                Turn::human(record.prompt.clone().unwrap_or_default()),
                Turn::gpt(serde_json::to_string(&answer)?),
            ],
        })
    }
}

/// Loads samples from a `.json` array file or a `.jsonl` file with one sample per line.
pub fn load_samples<T>(path: impl AsRef<Path>) -> Result<Vec<T>>
where
    T: serde::de::DeserializeOwned,
{
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);

    let is_jsonl = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("jsonl"))
        .unwrap_or(false);

    if is_jsonl {
        reader
            .lines()
            .enumerate()
            .filter(|(_, line)| !matches!(line, Ok(line) if line.trim().is_empty()))
            .map(|(lineno, line)| {
                let line = line?;
                serde_json::from_str(line.trim()).map_err(|err| {
                    Error::malformed_sample(format!(
                        "{}:{}: {}",
                        path.display(),
                        lineno + 1,
                        err
                    ))
                })
            })
            .collect()
    } else {
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Writes samples as a pretty-printed JSON array.
pub fn save_samples<T>(path: impl AsRef<Path>, samples: &[T]) -> Result<()>
where
    T: Serialize,
{
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, samples)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABS: CoordinateSystem = CoordinateSystem::Absolute;

    fn sample(answer: &str) -> Sample {
        Sample {
            image: "img.jpg".into(),
            conversations: vec![Turn::human("<image>\nWhere?"), Turn::gpt(answer)],
        }
    }

    #[test]
    fn decode_single_object() {
        let record = sample(r#"{"bbox_2d": [1, 2, 3, 4], "label": "cup", "color": "red"}"#)
            .to_record(ABS)
            .unwrap();
        assert_eq!(record.layout, Layout::Single);
        assert_eq!(record.regions.len(), 1);
        assert_eq!(record.regions[0].attributes["color"], "red");
        assert_eq!(record.prompt.as_deref(), Some("<image>\nWhere?"));

        let encoded = Sample::from_record(&record).unwrap();
        assert_eq!(
            encoded.conversations[1].value,
            r#"{"bbox_2d":[1,2,3,4],"label":"cup","color":"red"}"#
        );
    }

    #[test]
    fn decode_mixed_list() {
        let record = sample(
            r#"[{"bbox_2d": [1, 2, 3, 4], "label": "cup"}, {"point_2d": [5, 6], "label": "dot"}]"#,
        )
        .to_record(ABS)
        .unwrap();
        assert_eq!(record.layout, Layout::List);
        assert_eq!(record.regions.len(), 2);
        assert!(sample("[]").to_record(ABS).unwrap().regions.is_empty());
    }

    #[test]
    fn reject_malformed_samples() {
        assert!(matches!(
            sample("not json").to_record(ABS),
            Err(Error::MalformedSample(_))
        ));
        assert!(matches!(
            sample("42").to_record(ABS),
            Err(Error::MalformedSample(_))
        ));
        assert!(matches!(
            sample(r#"[{"point_2d": [1], "label": "a"}]"#).to_record(ABS),
            Err(Error::MalformedRegion(_))
        ));

        let mut one_turn = sample("[]");
        one_turn.conversations.pop();
        assert!(matches!(
            one_turn.to_record(ABS),
            Err(Error::MalformedSample(_))
        ));
    }

    #[test]
    fn refuse_to_encode_inconsistent_record() {
        let record = AnnotationRecord::new(
            "a.jpg",
            vec![
                Region::point([1, 2], ABS, "a").unwrap(),
                Region::point([1, 2], CoordinateSystem::RelativeThousand, "b").unwrap(),
            ],
        );
        assert!(matches!(
            Sample::from_record(&record),
            Err(Error::InconsistentCoordinateSystem { .. })
        ));
    }
}
