use anyhow::{bail, Context, Result};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::{self, BufReader, Write};
use std::sync::Arc;
use tracing::info;

pub type BlockId = Arc<str>;

/// A labelled block. Identity is the id alone: two blocks with the same id
/// are the same block regardless of colour data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub color_group: Arc<str>,
    #[serde(default)]
    pub rgb: [u8; 3],
}

impl Block {
    pub fn new(id: &str, color_group: &str, rgb: [u8; 3]) -> Self {
        Block {
            id: id.into(),
            color_group: color_group.into(),
            rgb,
        }
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Block {}

impl Hash for Block {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Colour group used when generating random models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorGroup {
    pub name: String,
    pub rgb: [u8; 3],
}

impl ColorGroup {
    pub fn default_palette() -> Vec<ColorGroup> {
        vec![
            ColorGroup {
                name: "red".to_string(),
                rgb: [220, 40, 40],
            },
            ColorGroup {
                name: "green".to_string(),
                rgb: [40, 180, 60],
            },
            ColorGroup {
                name: "blue".to_string(),
                rgb: [40, 80, 220],
            },
        ]
    }
}

/// Stacks of blocks from left to right; inside a stack index 0 is the bottom.
///
/// The model is a persistent value: `pop` and `add` hand back a new model and
/// leave `self` untouched, so search nodes can keep old states around.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldModel {
    stacks: Vec<Vec<Block>>,
}

impl WorldModel {
    pub fn from_stacks(stacks: Vec<Vec<Block>>) -> Self {
        WorldModel { stacks }
    }

    pub fn stacks(&self) -> &[Vec<Block>] {
        &self.stacks
    }

    pub fn stack(&self, stack_idx: usize) -> &[Block] {
        self.stacks.get(stack_idx).map_or(&[], |stack| stack.as_slice())
    }

    pub fn stack_count(&self) -> usize {
        self.stacks.len()
    }

    pub fn block_count(&self) -> usize {
        self.stacks.iter().map(Vec::len).sum()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.stacks.iter().flatten()
    }

    pub fn top(&self, stack_idx: usize) -> Option<&Block> {
        self.stacks.get(stack_idx).and_then(|stack| stack.last())
    }

    pub fn block_at(&self, stack_idx: usize, block_idx: usize) -> Option<&Block> {
        self.stacks
            .get(stack_idx)
            .and_then(|stack| stack.get(block_idx))
    }

    /// Position `(stack, height)` of the block with the given id.
    pub fn locate(&self, id: &str) -> Option<(usize, usize)> {
        self.stacks.iter().enumerate().find_map(|(i, stack)| {
            stack
                .iter()
                .position(|block| &*block.id == id)
                .map(|j| (i, j))
        })
    }

    /// Removes the block at `(stack_idx, block_idx)` and returns the new model
    /// with the removed block. `None` if the position is empty.
    pub fn pop(&self, stack_idx: usize, block_idx: usize) -> Option<(WorldModel, Block)> {
        let block = self.block_at(stack_idx, block_idx)?.clone();
        let mut stacks = self.stacks.clone();
        stacks[stack_idx].remove(block_idx);
        Some((WorldModel { stacks }, block))
    }

    /// Places `block` on top of stack `stack_idx`. `None` if there is no such stack.
    pub fn add(&self, block: Block, stack_idx: usize) -> Option<WorldModel> {
        if stack_idx >= self.stacks.len() {
            return None;
        }
        let mut stacks = self.stacks.clone();
        stacks[stack_idx].push(block);
        Some(WorldModel { stacks })
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for block in self.blocks() {
            if !seen.insert(&block.id) {
                bail!("duplicate block id {:?} in model", block.id);
            }
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let model: WorldModel = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("failed to open model {path}"))?;
        let reader = BufReader::new(file);
        let model: WorldModel = serde_json::from_reader(reader)
            .with_context(|| format!("failed to parse model {path}"))?;
        model
            .validate()
            .with_context(|| format!("invalid model {path}"))?;
        Ok(model)
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = io::BufWriter::new(file);
        writer.write_all(self.to_json_string()?.as_bytes())?;
        Ok(())
    }

    /// Same blocks and stack count, random arrangement.
    pub fn shuffle<R: Rng + ?Sized>(&self, rng: &mut R) -> WorldModel {
        let mut stacks = vec![Vec::new(); self.stacks.len()];
        let mut blocks: Vec<Block> = self.blocks().cloned().collect();
        blocks.shuffle(rng);
        if stacks.is_empty() {
            return WorldModel { stacks };
        }
        for block in blocks {
            let stack_idx = rng.gen_range(0..stacks.len());
            stacks[stack_idx].push(block);
        }
        WorldModel { stacks }
    }

    /// Random model of `n_blocks` blocks drawn from `palette`, framed by one
    /// empty stack on each side.
    pub fn random<R: Rng + ?Sized>(
        n_blocks: usize,
        palette: &[ColorGroup],
        rng: &mut R,
    ) -> Result<WorldModel> {
        if palette.is_empty() {
            bail!("cannot generate blocks from an empty palette");
        }

        let mut counters = vec![0usize; palette.len()];
        let mut blocks = Vec::with_capacity(n_blocks);
        for _ in 0..n_blocks {
            let color_idx = rng.gen_range(0..palette.len());
            let color = &palette[color_idx];
            let id = format!("{}_{}", color.name, counters[color_idx]);
            counters[color_idx] += 1;
            blocks.push(Block::new(&id, &color.name, color.rgb));
        }

        let mut stacks: Vec<Vec<Block>> = Vec::new();
        while !blocks.is_empty() {
            let block = blocks.swap_remove(rng.gen_range(0..blocks.len()));
            if !stacks.is_empty() && rng.gen_bool(0.5) {
                let stack_idx = rng.gen_range(0..stacks.len());
                stacks[stack_idx].push(block);
            } else {
                stacks.push(vec![block]);
            }
        }
        stacks.insert(0, Vec::new());
        stacks.push(Vec::new());

        let model = WorldModel { stacks };
        info!("Generate model: {model}");
        Ok(model)
    }
}

impl fmt::Display for WorldModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stack) in self.stacks.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "[")?;
            for (j, block) in stack.iter().enumerate() {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{block}")?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}
