//! Monthly replication of a prescription.
//!
//! One copy is produced per requested month. Copy `m` carries the issue date
//! shifted by `m` calendar months and is planned and composed on its own:
//! page numbering and entry numbering restart for every copy.

use crate::calendar::{add_calendar_months, parse_date};
use crate::canvas::Canvas;
use crate::composer::{PageComposer, PageGeometry};
use crate::config::{LayoutConfig, LetterheadConfig};
use crate::planner::OverflowPlanner;
use crate::{MonthlyCopy, Page, PrescriptionDocument, Region, RegionKind, Result};
use chrono::NaiveDate;

/// Drives planning and composition for every monthly copy
#[derive(Clone, Copy, Debug)]
pub struct MonthReplicator<'a> {
    layout: &'a LayoutConfig,
    letterhead: &'a LetterheadConfig,
}

/// Inputs shared by every copy of one document
struct CopyContext<'a> {
    document: &'a PrescriptionDocument,
    birth_date: NaiveDate,
    geometry: PageGeometry<'a>,
    planner: OverflowPlanner,
}

impl<'a> MonthReplicator<'a> {
    pub fn new(layout: &'a LayoutConfig, letterhead: &'a LetterheadConfig) -> Self {
        Self { layout, letterhead }
    }

    /// Lay out every monthly copy of the document onto the canvas
    ///
    /// Pages are drawn in copy order, then page order. On error the canvas
    /// holds a partial document and must be discarded.
    pub fn generate<C: Canvas>(
        &self,
        document: &PrescriptionDocument,
        canvas: &mut C,
    ) -> Result<Vec<MonthlyCopy>> {
        self.layout.validate()?;

        let issue_date = parse_date("issue_date", &document.issue_date)?;
        let birth_date = parse_date("birth_date", &document.patient.birth_date)?;

        let replication_count = if document.replication_count == 0 {
            tracing::warn!("Replication count of 0 requested; producing a single copy");
            1
        } else {
            document.replication_count
        };
        let last_date = add_calendar_months(issue_date, replication_count - 1)?;
        tracing::debug!("Copies run from {} to {}", issue_date, last_date);

        let geometry = PageGeometry::new(self.layout, self.letterhead, canvas.page_dimensions());
        let reserved = geometry.reserved_space(document.observations());
        let planner = OverflowPlanner::new(
            geometry.size().height,
            self.layout.entry_height(),
            reserved,
        );
        let ctx = CopyContext {
            document,
            birth_date,
            geometry,
            planner,
        };

        let mut copies = Vec::new();
        for month_offset in 0..replication_count {
            let copy_date = add_calendar_months(issue_date, month_offset)?;
            let copy = Self::compose_copy(&ctx, month_offset, copy_date, canvas)?;
            tracing::debug!(
                "Composed copy {} dated {} with {} pages",
                month_offset + 1,
                copy_date,
                copy.pages.len()
            );
            copies.push(copy);
        }

        tracing::info!(
            "Generated {} copies ({} pages, {} medicines each)",
            copies.len(),
            copies.iter().map(|c| c.pages.len()).sum::<usize>(),
            document.medicines.len()
        );

        Ok(copies)
    }

    fn compose_copy<C: Canvas>(
        ctx: &CopyContext<'_>,
        month_offset: u32,
        issue_date: NaiveDate,
        canvas: &mut C,
    ) -> Result<MonthlyCopy> {
        let document = ctx.document;
        let plan = ctx.planner.plan(&document.medicines)?;
        let total = plan.page_count();
        let reserved = ctx.geometry.reserved_space(document.observations());
        let page_height = ctx.geometry.size().height;
        let entries_limit = page_height - reserved.bottom;

        let mut composer = PageComposer::new(canvas, ctx.geometry);
        let mut pages = Vec::with_capacity(total);
        let mut next_number = 1;

        for (i, chunk) in plan.chunks.iter().enumerate() {
            let index = i + 1;
            let mut regions = Vec::with_capacity(4);

            let mut cursor = composer.begin_page(index, total)?;
            regions.push(Region {
                kind: RegionKind::Header,
                top: 0.0,
                bottom: cursor,
            });

            if index == 1 {
                let top = cursor;
                cursor = composer.write_patient_block(
                    cursor,
                    &document.patient,
                    ctx.birth_date,
                    issue_date,
                )?;
                regions.push(Region {
                    kind: RegionKind::PatientBlock,
                    top,
                    bottom: cursor,
                });
            }

            let top = cursor;
            cursor = composer.write_medicine_block(cursor, chunk, next_number)?;
            regions.push(Region {
                kind: RegionKind::Medicines,
                top,
                bottom: cursor,
            });

            if cursor > entries_limit {
                tracing::warn!(
                    "Page {} of copy {} overruns the footer reserve ({:.1}mm > {:.1}mm)",
                    index,
                    month_offset + 1,
                    cursor,
                    entries_limit
                );
            }

            if index == total {
                let signature_y = composer.write_footer(cursor, document.observations())?;
                if signature_y > page_height {
                    tracing::warn!(
                        "Footer of copy {} ends at {:.1}mm, past the {:.1}mm page",
                        month_offset + 1,
                        signature_y,
                        page_height
                    );
                }
                regions.push(Region {
                    kind: RegionKind::Footer,
                    top: cursor,
                    bottom: signature_y,
                });
            }

            pages.push(Page {
                index,
                total,
                regions,
                medicines: chunk.to_vec(),
                first_entry_number: next_number,
            });
            next_number += chunk.len();
        }

        Ok(MonthlyCopy {
            month_offset,
            issue_date,
            first_page_capacity: plan.first_capacity,
            continuation_capacity: plan.later_capacity,
            pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{PageSize, RecordingCanvas};
    use crate::{Error, MedicineLine, Patient};

    const CONTROLLED_NOTICE: &str = "*** MEDICAMENTO CONTROLADO ***";

    fn medicines(n: usize) -> Vec<MedicineLine> {
        (1..=n)
            .map(|i| MedicineLine {
                name: format!("Medicamento {}", i),
                dosage: format!("{}mg", i * 10),
                presentation: "Comprimido".into(),
                instructions: "1 comprimido de 12 em 12 horas".into(),
                controlled: false,
            })
            .collect()
    }

    fn document(medicines: Vec<MedicineLine>, replication_count: u32) -> PrescriptionDocument {
        PrescriptionDocument {
            patient: Patient {
                name: "João Pereira".into(),
                identifier: "898 0012 3456 7890".into(),
                birth_date: "1972-08-15".into(),
            },
            medicines,
            observations: None,
            issue_date: "2024-01-31".into(),
            replication_count,
        }
    }

    fn generate(doc: &PrescriptionDocument) -> (Vec<MonthlyCopy>, RecordingCanvas) {
        crate::logging::init_test();
        let layout = LayoutConfig::default();
        let letterhead = LetterheadConfig::default();
        let mut canvas = RecordingCanvas::new(PageSize::A4);
        let copies = MonthReplicator::new(&layout, &letterhead)
            .generate(doc, &mut canvas)
            .unwrap();
        (copies, canvas)
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_short_list_single_page_per_copy() {
        let doc = document(medicines(3), 4);
        let (copies, canvas) = generate(&doc);

        assert_eq!(copies.len(), 4);
        assert!(copies.iter().all(|c| c.pages.len() == 1));
        assert_eq!(canvas.page_count(), 4);

        let page = &copies[0].pages[0];
        assert!(page.has_region(RegionKind::PatientBlock));
        assert!(page.has_region(RegionKind::Footer));
        assert!(!canvas.page_texts(0).iter().any(|t| t.starts_with("Página")));
    }

    #[test]
    fn test_overflow_page_count_and_order() {
        // A4 defaults: 3 entries on the first page, 4 on continuation pages
        for n in [4usize, 7, 8, 11, 20] {
            let doc = document(medicines(n), 2);
            let (copies, _) = generate(&doc);

            for copy in &copies {
                assert_eq!(copy.pages.len(), 1 + (n - 3).div_ceil(4), "n = {}", n);
                let flattened: Vec<MedicineLine> = copy.medicines().cloned().collect();
                assert_eq!(flattened, doc.medicines, "n = {}", n);
            }
        }
    }

    #[test]
    fn test_continuation_pages_layout() {
        let doc = document(medicines(9), 1);
        let (copies, canvas) = generate(&doc);
        let pages = &copies[0].pages;

        assert_eq!(pages.len(), 3);
        assert_eq!(
            pages.iter().map(|p| p.first_entry_number).collect::<Vec<_>>(),
            vec![1, 4, 8]
        );

        assert!(pages[0].has_region(RegionKind::PatientBlock));
        assert!(!pages[1].has_region(RegionKind::PatientBlock));
        assert!(!pages[0].has_region(RegionKind::Footer));
        assert!(!pages[1].has_region(RegionKind::Footer));
        assert!(pages[2].has_region(RegionKind::Footer));

        assert!(canvas.page_texts(1).contains(&"Página 2 de 3"));
        assert!(canvas.page_texts(1).contains(&"4. Medicamento 4 40mg"));
    }

    #[test]
    fn test_regions_do_not_overlap() {
        let mut doc = document(medicines(6), 1);
        doc.observations = Some("Retornar em 30 dias.".into());
        let (copies, _) = generate(&doc);

        for page in &copies[0].pages {
            for pair in page.regions.windows(2) {
                assert!(pair[0].bottom <= pair[1].top, "{:?}", pair);
            }
            assert!(page.regions.iter().all(|r| r.bottom <= 297.0));
        }
    }

    #[test]
    fn test_month_dates_clamp_to_end_of_month() {
        let doc = document(medicines(1), 2);
        let (copies, canvas) = generate(&doc);

        assert_eq!(copies[0].issue_date, ymd(2024, 1, 31));
        assert_eq!(copies[1].issue_date, ymd(2024, 2, 29));
        assert!(canvas.page_texts(1).contains(&"Data da Receita: 29/02/2024"));
    }

    #[test]
    fn test_empty_list_one_page_per_copy() {
        let doc = document(Vec::new(), 3);
        let (copies, canvas) = generate(&doc);

        assert_eq!(copies.len(), 3);
        assert_eq!(canvas.page_count(), 3);
        for copy in &copies {
            assert_eq!(copy.pages.len(), 1);
            let page = &copy.pages[0];
            assert!(page.medicines.is_empty());
            assert!(page.has_region(RegionKind::Header));
            assert!(page.has_region(RegionKind::PatientBlock));
            assert!(page.has_region(RegionKind::Medicines));
            assert!(page.has_region(RegionKind::Footer));
        }
    }

    #[test]
    fn test_controlled_notice_follows_line_across_pages() {
        let mut lines = medicines(9);
        lines[4].controlled = true; // lands on page 2
        let doc = document(lines, 2);
        let (copies, canvas) = generate(&doc);

        let mut canvas_page = 0;
        for copy in &copies {
            for page in &copy.pages {
                let notices = canvas
                    .page_texts(canvas_page)
                    .iter()
                    .filter(|t| **t == CONTROLLED_NOTICE)
                    .count();
                let flagged = page.medicines.iter().filter(|m| m.controlled).count();
                assert_eq!(notices, flagged);
                if page.index == 2 {
                    assert_eq!(notices, 1);
                }
                canvas_page += 1;
            }
        }
    }

    #[test]
    fn test_page_marker_uses_copy_total() {
        let doc = document(medicines(5), 3);
        let (copies, canvas) = generate(&doc);

        assert!(copies.iter().all(|c| c.pages.len() == 2));
        for copy_index in 0..3 {
            assert!(canvas.page_texts(copy_index * 2).contains(&"Página 1 de 2"));
            assert!(canvas.page_texts(copy_index * 2 + 1).contains(&"Página 2 de 2"));
        }
    }

    #[test]
    fn test_generation_is_idempotent() {
        let mut doc = document(medicines(8), 2);
        doc.medicines[2].controlled = true;
        doc.observations = Some("Uso contínuo.".into());

        let (first_copies, first_canvas) = generate(&doc);
        let (second_copies, second_canvas) = generate(&doc);

        assert_eq!(first_copies, second_copies);
        assert_eq!(first_canvas.finish().unwrap(), second_canvas.finish().unwrap());
    }

    #[test]
    fn test_zero_replication_count_yields_one_copy() {
        let doc = document(medicines(2), 0);
        let (copies, _) = generate(&doc);
        assert_eq!(copies.len(), 1);
    }

    #[test]
    fn test_invalid_issue_date() {
        let mut doc = document(medicines(2), 1);
        doc.issue_date = "31/02/2024".into();

        let layout = LayoutConfig::default();
        let letterhead = LetterheadConfig::default();
        let mut canvas = RecordingCanvas::new(PageSize::A4);
        let result = MonthReplicator::new(&layout, &letterhead).generate(&doc, &mut canvas);

        assert!(matches!(
            result,
            Err(Error::InvalidDate { field: "issue_date", .. })
        ));
        assert_eq!(canvas.page_count(), 0);
    }

    #[test]
    fn test_count_beyond_calendar_fails_before_drawing() {
        let doc = document(medicines(2), u32::MAX);

        let layout = LayoutConfig::default();
        let letterhead = LetterheadConfig::default();
        let mut canvas = RecordingCanvas::new(PageSize::A4);
        let result = MonthReplicator::new(&layout, &letterhead).generate(&doc, &mut canvas);

        assert!(matches!(
            result,
            Err(Error::InvalidDate { field: "issue_date", .. })
        ));
        assert_eq!(canvas.page_count(), 0);
    }

    #[test]
    fn test_overlapping_entry_layout_is_rejected() {
        let doc = document(medicines(2), 1);
        let layout = LayoutConfig {
            lines_per_entry: 3,
            ..LayoutConfig::default()
        };
        let letterhead = LetterheadConfig::default();
        let mut canvas = RecordingCanvas::new(PageSize::A4);
        let result = MonthReplicator::new(&layout, &letterhead).generate(&doc, &mut canvas);

        assert!(matches!(result, Err(Error::Config(_))));
        assert_eq!(canvas.page_count(), 0);
    }

    #[test]
    fn test_copies_record_planned_capacities() {
        let doc = document(medicines(9), 2);
        let (copies, _) = generate(&doc);

        for copy in &copies {
            assert_eq!(copy.first_page_capacity, 3);
            assert_eq!(copy.continuation_capacity, 4);
        }
    }

    #[test]
    fn test_oversized_observations_push_footer_off_page() {
        let mut doc = document(medicines(2), 1);
        let notes: Vec<String> = (1..=40).map(|i| format!("Nota {}", i)).collect();
        doc.observations = Some(notes.join("\n"));

        let (copies, canvas) = generate(&doc);
        let copy = &copies[0];

        assert_eq!(copy.first_page_capacity, 1);
        assert_eq!(copy.continuation_capacity, 1);
        assert_eq!(copy.pages.len(), 2);
        assert_eq!(canvas.page_count(), 2);

        assert!(copy.pages[0].fits(297.0));
        assert!(!copy.pages[1].fits(297.0));
        let footer = copy.pages[1].region(RegionKind::Footer).unwrap();
        assert!(footer.bottom > 297.0);
        assert!(canvas.page_texts(1).contains(&"Nota 40"));
    }

    #[test]
    fn test_tiny_page_still_progresses() {
        let doc = document(medicines(3), 1);
        let layout = LayoutConfig::default();
        let letterhead = LetterheadConfig::default();
        let mut canvas = RecordingCanvas::new(PageSize {
            width: 100.0,
            height: 120.0,
        });

        let copies = MonthReplicator::new(&layout, &letterhead)
            .generate(&doc, &mut canvas)
            .unwrap();

        assert_eq!(copies[0].pages.len(), 3);
        assert!(copies[0].pages.iter().all(|p| p.medicines.len() == 1));
    }
}
