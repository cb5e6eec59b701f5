//! Cityscapes label table and label-image value schemes.

use std::fmt;
use std::str::FromStr;

/// Suffix of polygon annotation files.
pub const POLYGON_SUFFIX: &str = "_polygons.json";

/// Number of evaluated train IDs in the Cityscapes palette.
pub const CITYSCAPES_NUM_CLASSES: usize = 19;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    pub name: &'static str,
    pub id: i16,
    /// 255 marks pixels ignored during training.
    pub train_id: i16,
}

const fn label(name: &'static str, id: i16, train_id: i16) -> Label {
    Label { name, id, train_id }
}

pub const CITYSCAPES_LABELS: &[Label] = &[
    label("unlabeled", 0, 255),
    label("ego vehicle", 1, 255),
    label("rectification border", 2, 255),
    label("out of roi", 3, 255),
    label("static", 4, 255),
    label("dynamic", 5, 255),
    label("ground", 6, 255),
    label("road", 7, 0),
    label("sidewalk", 8, 1),
    label("parking", 9, 255),
    label("rail track", 10, 255),
    label("building", 11, 2),
    label("wall", 12, 3),
    label("fence", 13, 4),
    label("guard rail", 14, 255),
    label("bridge", 15, 255),
    label("tunnel", 16, 255),
    label("pole", 17, 5),
    label("polegroup", 18, 255),
    label("traffic light", 19, 6),
    label("traffic sign", 20, 7),
    label("vegetation", 21, 8),
    label("terrain", 22, 9),
    label("sky", 23, 10),
    label("person", 24, 11),
    label("rider", 25, 12),
    label("car", 26, 13),
    label("truck", 27, 14),
    label("bus", 28, 15),
    label("caravan", 29, 255),
    label("trailer", 30, 255),
    label("train", 31, 16),
    label("motorcycle", 32, 17),
    label("bicycle", 33, 18),
    label("license plate", -1, -1),
];

/// Looks up a label by name. Unknown `*group` names fall back to the base label.
pub fn lookup(name: &str) -> Option<&'static Label> {
    let find = |n: &str| CITYSCAPES_LABELS.iter().find(|l| l.name == n);
    find(name).or_else(|| name.strip_suffix("group").and_then(find))
}

/// Which label field is burned into the label image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelScheme {
    Ids,
    #[default]
    TrainIds,
}

impl LabelScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelScheme::Ids => "ids",
            LabelScheme::TrainIds => "trainIds",
        }
    }

    /// Suffix replacing [`POLYGON_SUFFIX`] for the generated label image.
    pub fn label_suffix(&self) -> &'static str {
        match self {
            LabelScheme::Ids => "_labelIds.png",
            LabelScheme::TrainIds => "_labelTrainIds.png",
        }
    }

    /// Pixel value for `label`, or `None` when the label is not drawn.
    pub fn value_of(&self, label: &Label) -> Option<u8> {
        let v = match self {
            LabelScheme::Ids => label.id,
            LabelScheme::TrainIds => label.train_id,
        };
        if label.id < 0 || v < 0 {
            return None;
        }
        u8::try_from(v).ok()
    }

    /// Canvas fill value: the `unlabeled` entry.
    pub fn background(&self) -> u8 {
        let unlabeled = &CITYSCAPES_LABELS[0];
        self.value_of(unlabeled).unwrap_or(0)
    }
}

impl fmt::Display for LabelScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LabelScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ids" => Ok(LabelScheme::Ids),
            "trainIds" | "train_ids" => Ok(LabelScheme::TrainIds),
            other => Err(format!("unknown label scheme '{other}' (expected ids or trainIds)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn train_ids_cover_the_palette_once() {
        let mut seen = [false; CITYSCAPES_NUM_CLASSES];
        for l in CITYSCAPES_LABELS {
            if (0..CITYSCAPES_NUM_CLASSES as i16).contains(&l.train_id) {
                assert!(!seen[l.train_id as usize], "duplicate train id {}", l.train_id);
                seen[l.train_id as usize] = true;
            }
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn group_names_fall_back() {
        assert_eq!(lookup("cargroup").map(|l| l.name), Some("car"));
        assert_eq!(lookup("polegroup").map(|l| l.id), Some(18));
        assert!(lookup("spaceship").is_none());
    }

    #[test]
    fn scheme_values() {
        let car = lookup("car").unwrap();
        assert_eq!(LabelScheme::TrainIds.value_of(car), Some(13));
        assert_eq!(LabelScheme::Ids.value_of(car), Some(26));
        let plate = lookup("license plate").unwrap();
        assert_eq!(LabelScheme::TrainIds.value_of(plate), None);
        assert_eq!(LabelScheme::TrainIds.background(), 255);
        assert_eq!(LabelScheme::Ids.background(), 0);
    }

    #[test]
    fn parses_scheme_names() {
        assert_eq!("trainIds".parse::<LabelScheme>(), Ok(LabelScheme::TrainIds));
        assert_eq!("ids".parse::<LabelScheme>(), Ok(LabelScheme::Ids));
        assert!("color".parse::<LabelScheme>().is_err());
    }
}
