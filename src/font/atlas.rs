// PixelFont
// copyright zipxing@hotmail.com 2022~2024

//! Texture atlas packer.
//!
//! Owns one grayscale bitmap and tracks which glyph sits where. Two
//! strategies share the eviction protocol:
//!
//! tight: guillotine packing, http://www.blackpawn.com/texts/lightmaps/default.html
//! Every split is produced in both orientations (A and B), cross-linked,
//! and the orientation committed only when a later request consumes one of
//! its nodes. The 0/1 pick per split is random, which avoids the packing
//! bias a fixed orientation gives.
//!
//! grid: the atlas is tiled into fixed bins up front, glyphs take bins in
//! encounter order, oversized glyphs are clipped to the bin.
//!
//! Glyphs with code <= 32 never enter the atlas. Once placed, a glyph
//! keeps its position until it is explicitly evicted.

use crate::font::glyph::{FontInfo, GlyphInfo, UnusedGlyphInfo};
use log::warn;
use rand::{rngs::ThreadRng, Rng};
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackingMethod {
    Tight,
    Grid,
}

/// Residency record of one glyph: the slot rectangle including border,
/// and whether the byte copy into the atlas happened yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedInfo {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub filled: bool,
}

pub type PackedKey = (usize, char);

type NodeId = usize;

/// A free rectangle. other[] points at the two nodes of the alternate
/// split orientation, same at the sibling of this orientation.
#[derive(Debug, Clone, Copy)]
struct Node {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    other: [Option<NodeId>; 2],
    same: Option<NodeId>,
    has_others: bool,
}

impl Node {
    fn rect(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            other: [None, None],
            same: None,
            has_others: false,
        }
    }
}

pub struct TextureAtlasPack {
    method: PackingMethod,

    // node arena, ids stay stable while the free queue is rearranged
    nodes: Vec<Option<Node>>,
    spare: Vec<NodeId>,
    free_space: VecDeque<NodeId>,

    grid_bin_w: i32,
    grid_bin_h: i32,

    w: i32,
    h: i32,
    border: i32,
    average_glyph_size: f32,
    placed_count: u32,

    free_pixels: i64,
    raw_packed_data: Vec<u8>,
    packed_info: HashMap<PackedKey, PackedInfo>,
    erased: HashSet<PackedKey>,

    dirty: bool,
    rng: ThreadRng,
}

impl TextureAtlasPack {
    pub fn new(w: i32, h: i32, border: i32) -> Self {
        let mut pack = Self {
            method: PackingMethod::Tight,
            nodes: vec![],
            spare: vec![],
            free_space: VecDeque::new(),
            grid_bin_w: 0,
            grid_bin_h: 0,
            w,
            h,
            border,
            average_glyph_size: 2500.0,
            placed_count: 1,
            free_pixels: (w as i64) * (h as i64),
            raw_packed_data: vec![0u8; (w * h) as usize],
            packed_info: HashMap::new(),
            erased: HashSet::new(),
            dirty: false,
            rng: rand::thread_rng(),
        };
        let root = pack.alloc(Node::rect(0, 0, w, h));
        pack.free_space.push_back(root);
        pack
    }

    pub fn method(&self) -> PackingMethod {
        self.method
    }

    pub fn texture(&self) -> &[u8] {
        &self.raw_packed_data
    }

    pub fn texture_width(&self) -> i32 {
        self.w
    }

    pub fn texture_height(&self) -> i32 {
        self.h
    }

    pub fn free_pixels(&self) -> i64 {
        self.free_pixels
    }

    pub fn packed_infos(&self) -> &HashMap<PackedKey, PackedInfo> {
        &self.packed_info
    }

    /// True once since the last call if the atlas bytes changed.
    pub fn take_dirty(&mut self) -> bool {
        let d = self.dirty;
        self.dirty = false;
        d
    }

    /// Select tight packing. Resets all placements, the raster bytes are
    /// rewritten by the next pack().
    pub fn set_tight_packing(&mut self) {
        self.method = PackingMethod::Tight;
        self.clear();
        let root = self.alloc(Node::rect(0, 0, self.w, self.h));
        self.free_space.push_back(root);
    }

    /// Select grid packing with bins of bin_w x bin_h (border not included,
    /// every bin is grown by 2*border). Resets all placements.
    pub fn set_grid_packing(&mut self, bin_w: i32, bin_h: i32) {
        self.grid_bin_w = bin_w;
        self.grid_bin_h = bin_h;
        self.method = PackingMethod::Grid;
        self.clear();

        let bin_w = bin_w + 2 * self.border;
        let bin_h = bin_h + 2 * self.border;
        if bin_w <= 0 || bin_h <= 0 {
            return;
        }

        let grided_h = self.h - self.h % bin_h;
        let grided_w = self.w - self.w % bin_w;
        let mut y = 0;
        while y < grided_h {
            let mut x = 0;
            while x < grided_w {
                let id = self.alloc(Node::rect(x, y, bin_w, bin_h));
                self.free_space.push_back(id);
                x += bin_w;
            }
            y += bin_h;
        }
    }

    /// Place every packable glyph of every font. Returns false when at
    /// least one glyph stayed unplaced even after eviction; the others are
    /// still packed and copied.
    pub fn pack(&mut self, fonts: &mut [FontInfo], unused: &mut Vec<UnusedGlyphInfo>) -> bool {
        let ok = match self.method {
            PackingMethod::Grid => self.pack_grid(fonts, unused),
            PackingMethod::Tight => self.pack_tight(fonts, unused),
        };
        self.copy_data_to_texture(fonts);
        self.remove_erased(fonts, unused);
        ok
    }

    // ------------------------------------------------------------------
    // tight packing

    fn pack_tight(&mut self, fonts: &mut [FontInfo], unused: &mut Vec<UnusedGlyphInfo>) -> bool {
        let mut all_placed = true;

        for fi in 0..fonts.len() {
            // bigger glyphs first, the residual cuts stay useful longer
            let mut order: Vec<usize> = (0..fonts[fi].glyphs.len())
                .filter(|&g| self.needs_slot(fi, &fonts[fi].glyphs[g]))
                .collect();
            order.sort_by_key(|&g| {
                let gi = &fonts[fi].glyphs[g];
                std::cmp::Reverse(gi.bmp_w * gi.bmp_h)
            });

            for g in order {
                let (code, area, req_w, req_h) = {
                    let gi = &fonts[fi].glyphs[g];
                    (
                        gi.code,
                        gi.bmp_w * gi.bmp_h,
                        gi.bmp_w + 2 * self.border,
                        gi.bmp_h + 2 * self.border,
                    )
                };

                let slot = match self.find_empty_space(req_w, req_h) {
                    Some((x, y)) => Some((x, y, req_w, req_h)),
                    None => self.free_space_evict(req_w, req_h, unused),
                };

                match slot {
                    Some((x, y, w, h)) => {
                        self.place(&mut fonts[fi].glyphs[g], (fi, code), x, y, w, h, area);
                    }
                    None => {
                        warn!(
                            "atlas full: no space for U+{:04X} ({}x{})",
                            code as u32, req_w, req_h
                        );
                        all_placed = false;
                    }
                }
            }
        }
        all_placed
    }

    /// Walk the free queue, first fit wins. Nodes that fail the probe are
    /// rotated to the tail. The found node is consumed and guillotined.
    fn find_empty_space(&mut self, req_w: i32, req_h: i32) -> Option<(i32, i32)> {
        for _ in 0..self.free_space.len() {
            let id = self.free_space.pop_front()?;
            let node = self.nodes[id].expect("free queue holds live nodes");
            if node.w >= req_w && node.h >= req_h {
                self.consume(id, &node);
                self.divide_node(&node, req_w, req_h);
                return Some((node.x, node.y));
            }
            self.free_space.push_back(id);
        }
        None
    }

    /// Commit the split orientation this node belongs to: the alternate
    /// orientation's nodes disappear and the sibling stays as a plain
    /// free rectangle.
    fn consume(&mut self, id: NodeId, node: &Node) {
        self.free_node(id);
        if node.has_others {
            for alt in node.other.into_iter().flatten() {
                if let Some(pos) = self.free_space.iter().position(|&q| q == alt) {
                    self.free_space.remove(pos);
                }
                self.free_node(alt);
            }
        }
        if let Some(same_id) = node.same {
            if let Some(s) = self.nodes.get_mut(same_id).and_then(|n| n.as_mut()) {
                s.has_others = false;
                s.other = [None, None];
                s.same = None;
            }
        }
    }

    /// Guillotine the consumed rectangle around the placed req_w x req_h
    /// item. Both orientations are created and cross-linked; the random
    /// 0/1 only decides which one goes first in the queue.
    fn divide_node(&mut self, node: &Node, req_w: i32, req_h: i32) {
        let (x, y, w, h) = (node.x, node.y, node.w, node.h);

        // orientation A: cut at the placed height
        let a_rects = [(x + req_w, y, w - req_w, req_h), (x, y + req_h, w, h - req_h)];
        // orientation B: cut at the placed width
        let b_rects = [(x + req_w, y, w - req_w, h), (x, y + req_h, req_w, h - req_h)];

        let a_ids = self.alloc_rects(&a_rects);
        let b_ids = self.alloc_rects(&b_rects);

        self.link_variant(&a_ids, &b_ids);
        self.link_variant(&b_ids, &a_ids);

        let (first, second) = if self.rng.gen_range(0..2) == 0 {
            (&a_ids, &b_ids)
        } else {
            (&b_ids, &a_ids)
        };
        for &id in first.iter().chain(second.iter()) {
            self.free_space.push_back(id);
        }
    }

    fn alloc_rects(&mut self, rects: &[(i32, i32, i32, i32)]) -> Vec<NodeId> {
        rects
            .iter()
            .filter(|&&(_, _, w, h)| w > 0 && h > 0)
            .map(|&(x, y, w, h)| self.alloc(Node::rect(x, y, w, h)))
            .collect()
    }

    fn link_variant(&mut self, ids: &[NodeId], alts: &[NodeId]) {
        let other = [alts.first().copied(), alts.get(1).copied()];
        let has_others = !alts.is_empty();
        for (i, &id) in ids.iter().enumerate() {
            let same = if ids.len() == 2 { Some(ids[1 - i]) } else { None };
            if let Some(n) = self.nodes[id].as_mut() {
                n.other = other;
                n.same = same;
                n.has_others = has_others;
            }
        }
    }

    // ------------------------------------------------------------------
    // grid packing

    fn pack_grid(&mut self, fonts: &mut [FontInfo], unused: &mut Vec<UnusedGlyphInfo>) -> bool {
        let mut all_placed = true;
        let req_w = self.grid_bin_w + 2 * self.border;
        let req_h = self.grid_bin_h + 2 * self.border;

        for fi in 0..fonts.len() {
            for g in 0..fonts[fi].glyphs.len() {
                if !self.needs_slot(fi, &fonts[fi].glyphs[g]) {
                    continue;
                }
                let (code, bmp_w, bmp_h) = {
                    let gi = &fonts[fi].glyphs[g];
                    (gi.code, gi.bmp_w, gi.bmp_h)
                };
                if bmp_w > self.grid_bin_w || bmp_h > self.grid_bin_h {
                    warn!(
                        "glyph U+{:04X} ({}x{}) clipped to {}x{} bin",
                        code as u32, bmp_w, bmp_h, self.grid_bin_w, self.grid_bin_h
                    );
                }

                let slot = match self.take_free_bin() {
                    Some(s) => Some(s),
                    None => {
                        let atlas_area = (self.w as f32) * (self.h as f32);
                        if unused.len() as f32 * self.average_glyph_size >= 0.4 * atlas_area {
                            self.erase_all_unused(unused);
                            self.take_free_bin()
                        } else {
                            self.free_space_evict(req_w, req_h, unused)
                        }
                    }
                };

                match slot {
                    Some((x, y, w, h)) => {
                        let area = bmp_w.min(self.grid_bin_w) * bmp_h.min(self.grid_bin_h);
                        self.place(&mut fonts[fi].glyphs[g], (fi, code), x, y, w, h, area);
                    }
                    None => {
                        warn!("atlas full: no bin for U+{:04X}", code as u32);
                        all_placed = false;
                    }
                }
            }
        }
        all_placed
    }

    fn take_free_bin(&mut self) -> Option<(i32, i32, i32, i32)> {
        let id = self.free_space.pop_front()?;
        let n = self.nodes[id].expect("free queue holds live nodes");
        self.free_node(id);
        Some((n.x, n.y, n.w, n.h))
    }

    /// Bulk eviction: drop the whole unused set at once and hand the freed
    /// bins back to the queue.
    fn erase_all_unused(&mut self, unused: &[UnusedGlyphInfo]) {
        for u in unused {
            let key = (u.font_index, u.code);
            if self.erased.contains(&key) {
                continue;
            }
            if let Some(pi) = self.packed_info.remove(&key) {
                self.erased.insert(key);
                self.free_pixels += (pi.w as i64) * (pi.h as i64);
                let id = self.alloc(Node::rect(pi.x, pi.y, pi.w, pi.h));
                self.free_space.push_back(id);
                self.dirty = true;
            }
        }
    }

    // ------------------------------------------------------------------
    // shared

    fn needs_slot(&self, fi: usize, gi: &GlyphInfo) -> bool {
        !gi.is_whitespace()
            && gi.bmp_w > 0
            && gi.bmp_h > 0
            && !self.packed_info.contains_key(&(fi, gi.code))
    }

    /// One-at-a-time eviction: the first unused entry whose slot is at
    /// least the requested size is marked erased and its exact rectangle
    /// returned. No re-split happens on reuse.
    fn free_space_evict(
        &mut self,
        req_w: i32,
        req_h: i32,
        unused: &[UnusedGlyphInfo],
    ) -> Option<(i32, i32, i32, i32)> {
        for u in unused {
            let key = (u.font_index, u.code);
            if self.erased.contains(&key) {
                continue;
            }
            let Some(pi) = self.packed_info.get(&key) else {
                continue;
            };
            if pi.w >= req_w && pi.h >= req_h {
                let rect = (pi.x, pi.y, pi.w, pi.h);
                self.packed_info.remove(&key);
                self.erased.insert(key);
                self.free_pixels += (rect.2 as i64) * (rect.3 as i64);
                self.dirty = true;
                return Some(rect);
            }
        }
        None
    }

    fn place(
        &mut self,
        gi: &mut GlyphInfo,
        key: PackedKey,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        glyph_area: i32,
    ) {
        self.packed_info.insert(
            key,
            PackedInfo {
                x,
                y,
                w,
                h,
                filled: false,
            },
        );
        gi.tx = x + self.border;
        gi.ty = y + self.border;
        self.free_pixels -= (w as i64) * (h as i64);
        self.placed_count += 1;
        self.average_glyph_size +=
            (glyph_area as f32 - self.average_glyph_size) / self.placed_count as f32;
    }

    /// Copy every unfilled placement into the atlas bytes. The full slot is
    /// wiped first so a shrunken occupant cannot leave margin bytes of the
    /// previous one behind.
    fn copy_data_to_texture(&mut self, fonts: &[FontInfo]) {
        let pending: Vec<PackedKey> = self
            .packed_info
            .iter()
            .filter(|(_, pi)| !pi.filled)
            .map(|(k, _)| *k)
            .collect();

        for key in pending {
            let pi = self.packed_info[&key];
            let (fi, code) = key;

            for row in pi.y..pi.y + pi.h {
                let start = (row * self.w + pi.x) as usize;
                self.raw_packed_data[start..start + pi.w as usize].fill(0);
            }

            if let Some(gi) = fonts.get(fi).and_then(|f| f.glyph(code)) {
                if let Some(bytes) = &gi.raw_data {
                    let copy_w = gi.bmp_w.min(pi.w - 2 * self.border).max(0);
                    let copy_h = gi.bmp_h.min(pi.h - 2 * self.border).max(0);
                    for r in 0..copy_h {
                        let dst =
                            ((pi.y + self.border + r) * self.w + pi.x + self.border) as usize;
                        let src = (r * gi.bmp_w) as usize;
                        self.raw_packed_data[dst..dst + copy_w as usize]
                            .copy_from_slice(&bytes[src..src + copy_w as usize]);
                    }
                }
            }

            #[cfg(debug_assertions)]
            if self.border > 0 {
                self.draw_border(pi.x, pi.y, pi.w, pi.h, 125);
            }

            self.packed_info.get_mut(&key).unwrap().filled = true;
            self.dirty = true;
        }
    }

    #[cfg(debug_assertions)]
    fn draw_border(&mut self, px: i32, py: i32, pw: i32, ph: i32, border_val: u8) {
        for x in px..px + pw {
            self.raw_packed_data[(py * self.w + x) as usize] = border_val;
            self.raw_packed_data[((py + ph - 1) * self.w + x) as usize] = border_val;
        }
        for y in py..py + ph {
            self.raw_packed_data[(y * self.w + px) as usize] = border_val;
            self.raw_packed_data[(y * self.w + px + pw - 1) as usize] = border_val;
        }
    }

    /// Drain the erased set: raw bytes are released and the glyph leaves
    /// its font's lut and the unused list.
    fn remove_erased(&mut self, fonts: &mut [FontInfo], unused: &mut Vec<UnusedGlyphInfo>) {
        if self.erased.is_empty() {
            return;
        }
        let erased: Vec<PackedKey> = self.erased.drain().collect();
        for (fi, code) in erased {
            if let Some(f) = fonts.get_mut(fi) {
                f.remove_glyph(code);
            }
            unused.retain(|u| !(u.font_index == fi && u.code == code));
        }
    }

    fn clear(&mut self) {
        self.packed_info.clear();
        self.erased.clear();
        self.free_space.clear();
        self.nodes.clear();
        self.spare.clear();
        self.free_pixels = (self.w as i64) * (self.h as i64);
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.spare.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn free_node(&mut self, id: NodeId) {
        self.nodes[id] = None;
        self.spare.push(id);
    }

    /// Save the atlas as a grayscale PNG, debugging aid.
    pub fn save(&self, path: &str) -> Result<(), crate::error::FontError> {
        image::save_buffer(
            path,
            &self.raw_packed_data,
            self.w as u32,
            self.h as u32,
            image::ColorType::L8,
        )
        .map_err(|e| crate::error::FontError::Backend(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::glyph::tests::{test_font, test_glyph};
    use crate::font::glyph::GlyphInfo;

    fn glyph_with_value(code: char, w: i32, h: i32, val: u8) -> GlyphInfo {
        let mut g = test_glyph(code, w, h, 0);
        g.raw_data = Some(vec![val; (w * h) as usize]);
        g
    }

    fn assert_disjoint_and_in_bounds(pack: &TextureAtlasPack) {
        let rects: Vec<PackedInfo> = pack.packed_info.values().copied().collect();
        for pi in &rects {
            assert!(pi.x >= 0 && pi.y >= 0);
            assert!(pi.x + pi.w <= pack.w && pi.y + pi.h <= pack.h);
        }
        for (i, a) in rects.iter().enumerate() {
            for b in rects.iter().skip(i + 1) {
                let separated = a.x + a.w <= b.x
                    || b.x + b.w <= a.x
                    || a.y + a.h <= b.y
                    || b.y + b.h <= a.y;
                assert!(separated, "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn grid_pack_simple_ascii() {
        let mut pack = TextureAtlasPack::new(64, 64, 0);
        pack.set_grid_packing(16, 16);

        let mut fonts = vec![test_font(0)];
        fonts[0].insert_glyph(glyph_with_value('A', 14, 14, 200));
        let mut unused = vec![];

        assert!(pack.pack(&mut fonts, &mut unused));

        let pi = pack.packed_infos()[&(0, 'A')];
        assert_eq!((pi.x, pi.y, pi.w, pi.h), (0, 0, 16, 16));
        assert!(pi.filled);
        let gi = fonts[0].glyph('A').unwrap();
        assert_eq!((gi.tx, gi.ty), (0, 0));

        // glyph bytes landed in rows 0..13, columns 0..13
        assert_eq!(pack.texture()[0], 200);
        assert_eq!(pack.texture()[13 * 64 + 13], 200);
        assert_eq!(pack.texture()[14], 0);
        assert_eq!(pack.texture()[14 * 64], 0);
    }

    #[test]
    fn tight_pack_mixed_sizes() {
        let mut pack = TextureAtlasPack::new(32, 32, 0);
        pack.set_tight_packing();

        let mut fonts = vec![test_font(0)];
        // insertion order small-first, packing order must be big-first
        fonts[0].insert_glyph(glyph_with_value('s', 10, 10, 50));
        fonts[0].insert_glyph(glyph_with_value('L', 20, 20, 90));
        let mut unused = vec![];

        assert!(pack.pack(&mut fonts, &mut unused));
        assert_disjoint_and_in_bounds(&pack);

        let large = pack.packed_infos()[&(0, 'L')];
        assert_eq!((large.x, large.y), (0, 0));
        assert!(pack.packed_infos().contains_key(&(0, 's')));

        // free pixel accounting matches the placed slots
        let placed: i64 = pack
            .packed_infos()
            .values()
            .map(|pi| (pi.w as i64) * (pi.h as i64))
            .sum();
        assert_eq!(pack.free_pixels(), 32 * 32 - placed);
    }

    #[test]
    fn tight_pack_positions_are_stable_across_repacks() {
        let mut pack = TextureAtlasPack::new(64, 64, 0);
        pack.set_tight_packing();

        let mut fonts = vec![test_font(0)];
        fonts[0].insert_glyph(glyph_with_value('a', 12, 12, 10));
        let mut unused = vec![];
        assert!(pack.pack(&mut fonts, &mut unused));
        let before = pack.packed_infos()[&(0, 'a')];

        fonts[0].insert_glyph(glyph_with_value('b', 8, 8, 20));
        assert!(pack.pack(&mut fonts, &mut unused));
        let after = pack.packed_infos()[&(0, 'a')];
        assert_eq!(before, after);
        assert_disjoint_and_in_bounds(&pack);
    }

    #[test]
    fn whitespace_and_empty_bitmaps_never_pack() {
        let mut pack = TextureAtlasPack::new(64, 64, 0);
        pack.set_grid_packing(16, 16);

        let mut fonts = vec![test_font(0)];
        fonts[0].insert_glyph(glyph_with_value(' ', 4, 4, 1));
        fonts[0].insert_glyph(glyph_with_value('\n', 1, 1, 1));
        let mut zero = test_glyph('z', 0, 0, 0);
        zero.raw_data = None;
        fonts[0].insert_glyph(zero);
        let mut unused = vec![];

        assert!(pack.pack(&mut fonts, &mut unused));
        assert!(pack.packed_infos().is_empty());
        assert_eq!(pack.free_pixels(), 64 * 64);
    }

    #[test]
    fn grid_eviction_reuses_one_slot() {
        let mut pack = TextureAtlasPack::new(64, 64, 0);
        pack.set_grid_packing(16, 16);

        // 16 bins, fill them all
        let mut fonts = vec![test_font(0)];
        let codes: Vec<char> = ('a'..='p').collect();
        for &c in &codes {
            fonts[0].insert_glyph(glyph_with_value(c, 14, 14, 100));
        }
        let mut unused = vec![];
        assert!(pack.pack(&mut fonts, &mut unused));
        assert_eq!(pack.packed_infos().len(), 16);

        // four go unused, the 17th glyph must claim exactly one slot
        for &c in &codes[0..4] {
            unused.push(UnusedGlyphInfo {
                font_index: 0,
                code: c,
            });
        }
        // below the bulk threshold: 4 * avg < 0.4 * 64 * 64
        pack.average_glyph_size = 200.0;

        fonts[0].insert_glyph(glyph_with_value('q', 14, 14, 100));
        let victim_slots: Vec<PackedInfo> = codes[0..4]
            .iter()
            .map(|&c| pack.packed_infos()[&(0, c)])
            .collect();

        assert!(pack.pack(&mut fonts, &mut unused));
        assert!(pack.erased.is_empty());
        assert_eq!(pack.packed_infos().len(), 16);
        assert_eq!(unused.len(), 3);

        // exactly one victim disappeared from both the atlas and the font
        let evicted: Vec<char> = codes[0..4]
            .iter()
            .copied()
            .filter(|&c| !pack.packed_infos().contains_key(&(0, c)))
            .collect();
        assert_eq!(evicted.len(), 1);
        assert!(fonts[0].glyph(evicted[0]).is_none());

        let q = pack.packed_infos()[&(0, 'q')];
        assert!(victim_slots
            .iter()
            .any(|s| (s.x, s.y, s.w, s.h) == (q.x, q.y, q.w, q.h)));
        assert_disjoint_and_in_bounds(&pack);
    }

    #[test]
    fn eviction_marks_then_drains_erased() {
        let mut pack = TextureAtlasPack::new(32, 32, 0);
        pack.set_grid_packing(16, 16);

        let mut fonts = vec![test_font(0)];
        for c in ['a', 'b', 'c', 'd'] {
            fonts[0].insert_glyph(glyph_with_value(c, 10, 10, 40));
        }
        let mut unused = vec![];
        assert!(pack.pack(&mut fonts, &mut unused));

        unused.push(UnusedGlyphInfo {
            font_index: 0,
            code: 'b',
        });
        let rect = pack.free_space_evict(16, 16, &unused).unwrap();
        assert_eq!(pack.erased.len(), 1);
        assert_eq!((rect.2, rect.3), (16, 16));

        pack.remove_erased(&mut fonts, &mut unused);
        assert!(pack.erased.is_empty());
        assert!(fonts[0].glyph('b').is_none());
        assert!(unused.is_empty());
    }

    #[test]
    fn grid_bulk_evicts_whole_unused_set() {
        let mut pack = TextureAtlasPack::new(64, 64, 0);
        pack.set_grid_packing(16, 16);

        let mut fonts = vec![test_font(0)];
        let codes: Vec<char> = ('a'..='p').collect();
        for &c in &codes {
            fonts[0].insert_glyph(glyph_with_value(c, 14, 14, 100));
        }
        let mut unused = vec![];
        assert!(pack.pack(&mut fonts, &mut unused));

        // every glyph unused, well past the 40% reclaim threshold
        for &c in &codes {
            unused.push(UnusedGlyphInfo {
                font_index: 0,
                code: c,
            });
        }
        fonts[0].insert_glyph(glyph_with_value('q', 14, 14, 100));

        assert!(pack.pack(&mut fonts, &mut unused));
        assert_eq!(pack.packed_infos().len(), 1);
        assert!(pack.packed_infos().contains_key(&(0, 'q')));
        assert!(unused.is_empty());
        assert_eq!(fonts[0].glyphs.len(), 1);
        assert_eq!(
            pack.free_pixels(),
            64 * 64 - 16 * 16
        );
    }

    #[test]
    fn tight_atlas_full_is_reported_and_partial() {
        let mut pack = TextureAtlasPack::new(24, 24, 0);
        pack.set_tight_packing();

        let mut fonts = vec![test_font(0)];
        fonts[0].insert_glyph(glyph_with_value('a', 20, 20, 10));
        fonts[0].insert_glyph(glyph_with_value('b', 20, 20, 20));
        let mut unused = vec![];

        assert!(!pack.pack(&mut fonts, &mut unused));
        assert_eq!(pack.packed_infos().len(), 1);
        assert_disjoint_and_in_bounds(&pack);
    }

    #[test]
    fn repack_copies_only_unfilled_entries() {
        let mut pack = TextureAtlasPack::new(64, 64, 0);
        pack.set_grid_packing(16, 16);

        let mut fonts = vec![test_font(0)];
        fonts[0].insert_glyph(glyph_with_value('a', 8, 8, 70));
        let mut unused = vec![];
        assert!(pack.pack(&mut fonts, &mut unused));
        assert!(pack.take_dirty());

        // nothing new: no byte traffic, no dirty flag
        assert!(pack.pack(&mut fonts, &mut unused));
        assert!(!pack.take_dirty());
    }
}
