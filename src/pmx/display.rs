use crate::pmx::Names;

/// UI display group listing bones and morphs.
#[derive(Debug, Clone)]
pub struct DisplayFrame {
    pub name: Names,
    pub special: bool,
    pub items: Vec<DisplayItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayItem {
    Bone(i32),
    Morph(i32),
}
