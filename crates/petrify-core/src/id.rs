//! Content hashes, object categories and (category, index) references.

use std::fmt;

/// 64-bit content fingerprint of one creation descriptor.
///
/// Derived only from descriptor content (and the content hashes of the
/// objects it references), never from a runtime handle value, so it is
/// stable across processes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ContentHash(pub u64);

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl From<u64> for ContentHash {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// One of the seven object kinds, in dependency order.
///
/// No descriptor references an object of a later category. The only
/// same-category references are derivative pipelines naming their base
/// pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Category {
    /// `VkSampler`.
    Sampler = 0,
    /// `VkDescriptorSetLayout`.
    DescriptorSetLayout = 1,
    /// `VkPipelineLayout`.
    PipelineLayout = 2,
    /// `VkShaderModule`.
    ShaderModule = 3,
    /// `VkRenderPass`.
    RenderPass = 4,
    /// Compute `VkPipeline`.
    ComputePipeline = 5,
    /// Graphics `VkPipeline`.
    GraphicsPipeline = 6,
}

impl Category {
    /// Number of categories.
    pub const COUNT: usize = 7;

    /// Every category in serialization and replay order.
    pub const ALL: [Category; Self::COUNT] = [
        Category::Sampler,
        Category::DescriptorSetLayout,
        Category::PipelineLayout,
        Category::ShaderModule,
        Category::RenderPass,
        Category::ComputePipeline,
        Category::GraphicsPipeline,
    ];

    /// Position in [`Category::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Decode a wire tag.
    pub fn from_u8(tag: u8) -> Option<Self> {
        Self::ALL.get(usize::from(tag)).copied()
    }

    /// Lower-case name used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sampler => "sampler",
            Self::DescriptorSetLayout => "descriptor-set-layout",
            Self::PipelineLayout => "pipeline-layout",
            Self::ShaderModule => "shader-module",
            Self::RenderPass => "render-pass",
            Self::ComputePipeline => "compute-pipeline",
            Self::GraphicsPipeline => "graphics-pipeline",
        }
    }

    /// Categories a descriptor of this category may reference.
    pub fn allowed_references(self) -> CategorySet {
        use Category::*;
        match self {
            Sampler | ShaderModule | RenderPass => CategorySet::EMPTY,
            DescriptorSetLayout => CategorySet::of(&[Sampler]),
            PipelineLayout => CategorySet::of(&[DescriptorSetLayout]),
            ComputePipeline => CategorySet::of(&[ShaderModule, PipelineLayout, ComputePipeline]),
            GraphicsPipeline => CategorySet::of(&[
                ShaderModule,
                PipelineLayout,
                RenderPass,
                GraphicsPipeline,
            ]),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A small bitset of [`Category`] values.
///
/// Bit `n` stands for the category with index `n`; bit 7 is never set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct CategorySet(u8);

impl CategorySet {
    /// The empty set.
    pub const EMPTY: CategorySet = CategorySet(0);

    const VALID_BITS: u8 = (1 << Category::COUNT) - 1;

    /// Set containing exactly the given categories.
    pub fn of(categories: &[Category]) -> Self {
        categories
            .iter()
            .fold(Self::EMPTY, |set, &c| set.with(c))
    }

    /// Rebuild a set from its raw bits. Fails if an unused bit is set.
    pub fn from_bits(bits: u8) -> Option<Self> {
        (bits & !Self::VALID_BITS == 0).then_some(Self(bits))
    }

    /// Raw bits.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Copy of `self` with `category` added.
    #[must_use]
    pub fn with(self, category: Category) -> Self {
        Self(self.0 | 1 << category.index())
    }

    /// Add `category` in place.
    pub fn insert(&mut self, category: Category) {
        *self = self.with(category);
    }

    /// Whether `category` is a member.
    pub fn contains(self, category: Category) -> bool {
        self.0 & (1 << category.index()) != 0
    }

    /// Members of either set.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether the two sets share a member.
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Whether every member of `self` is in `other`.
    pub fn is_subset(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }

    /// Whether the set has no members.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in category order.
    pub fn iter(self) -> impl Iterator<Item = Category> {
        Category::ALL.into_iter().filter(move |&c| self.contains(c))
    }
}

impl fmt::Display for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, c) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(c.name())?;
        }
        f.write_str("}")
    }
}

/// A recorded object named by its category and dense index.
///
/// This is how references travel through a blob: handles are rewritten
/// to `ObjectRef`s when a record is stored, and resolved back to the
/// replayed handles when it is decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    /// Category of the referenced record.
    pub category: Category,
    /// Index of the record within its category.
    pub index: u32,
}

impl ObjectRef {
    /// Construct a reference.
    pub fn new(category: Category, index: u32) -> Self {
        Self { category, index }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.category, self.index)
    }
}
